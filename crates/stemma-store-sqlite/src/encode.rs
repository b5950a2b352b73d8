//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings; vitals are compact JSON; UUIDs are
//! hyphenated lowercase strings; sex is a one-letter code.

use chrono::{DateTime, Utc};
use stemma_core::{Sex, Vitals, canonical_pair};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String {
  id.hyphenated().to_string()
}

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Ok(Uuid::parse_str(s)?)
}

pub fn decode_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── Sex ─────────────────────────────────────────────────────────────────────

pub fn encode_sex(s: Sex) -> &'static str {
  match s {
    Sex::Male => "M",
    Sex::Female => "F",
  }
}

pub fn decode_sex(s: &str) -> Result<Sex> {
  match s {
    "M" => Ok(Sex::Male),
    "F" => Ok(Sex::Female),
    other => Err(Error::Decode(format!("unknown sex code: {other:?}"))),
  }
}

// ─── Vitals ──────────────────────────────────────────────────────────────────

pub fn encode_vitals(v: Option<&Vitals>) -> Result<Option<String>> {
  v.map(|v| serde_json::to_string(v).map_err(Error::Json))
    .transpose()
}

pub fn decode_vitals(s: Option<&str>) -> Result<Option<Vitals>> {
  s.map(|s| serde_json::from_str(s).map_err(Error::Json))
    .transpose()
}

// ─── Canonical pair key ──────────────────────────────────────────────────────

/// The stored `pair_key` column: the canonically ordered parent ids joined
/// with `:`. `None` unless both slots are filled.
pub fn pair_key(husband: Option<Uuid>, wife: Option<Uuid>) -> Option<String> {
  match (husband, wife) {
    (Some(h), Some(w)) => {
      let (a, b) = canonical_pair(h, w);
      Some(format!("{}:{}", encode_uuid(a), encode_uuid(b)))
    }
    _ => None,
  }
}
