//! Person records — the fundamental entity of the chart store.
//!
//! A person is created on the first sighting of a person or spouse line and
//! enriched by additive merge on later sightings that resolve to the same
//! record. The engine never deletes person rows; reparse-scope cleanup is
//! owned by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text::normalize_key;

// ─── Vitals ──────────────────────────────────────────────────────────────────

/// One side of a birth/death range as read off the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
  /// Normalized text of this side of the range, e.g. `"abt 1640"`.
  pub raw:    String,
  /// Four-digit year extracted from `raw`, if one was present.
  pub year:   Option<i32>,
  /// True when the value was hedged, half-open, or OCR-ambiguous.
  pub approx: bool,
}

// ─── Sex ─────────────────────────────────────────────────────────────────────

/// Recorded sex, used only for parent-slot assignment in families.
/// Descendancy charts do not state it; outer layers (GEDCOM import, manual
/// edits) populate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
  #[serde(rename = "M")]
  Male,
  #[serde(rename = "F")]
  Female,
}

// ─── PersonRecord ────────────────────────────────────────────────────────────

/// A persisted person. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
  pub id:               Uuid,
  pub source_id:        Uuid,
  /// Tree depth; 1 is the chart root.
  pub generation:       u32,
  pub display_name:     String,
  pub given:            Option<String>,
  pub surname:          Option<String>,
  /// True when `surname` was borrowed from an ancestor rather than read off
  /// the line.
  pub surname_inferred: bool,
  pub title:            Option<String>,
  pub sex:              Option<Sex>,
  pub birth:            Option<Vitals>,
  pub death:            Option<Vitals>,
  pub notes:            Option<String>,
  /// Trailing chart id (`-117`); provenance only, never identity.
  pub chart_id:         Option<String>,
  /// Lowercased normalized name parts; fallback match keys only.
  pub norm_given:       Option<String>,
  pub norm_surname:     Option<String>,
  /// Source-scoped line key. Unique per source when present.
  pub fingerprint:      Option<String>,
  pub page_index:       Option<usize>,
  pub line_index:       Option<usize>,
  pub approx:           bool,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::ChartStore::insert_person`].
/// `id` and `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewPerson {
  pub source_id:        Uuid,
  pub generation:       u32,
  pub display_name:     String,
  pub given:            Option<String>,
  pub surname:          Option<String>,
  pub surname_inferred: bool,
  pub title:            Option<String>,
  pub sex:              Option<Sex>,
  pub birth:            Option<Vitals>,
  pub death:            Option<Vitals>,
  pub notes:            Option<String>,
  pub chart_id:         Option<String>,
  pub fingerprint:      Option<String>,
  pub page_index:       Option<usize>,
  pub line_index:       Option<usize>,
  pub approx:           bool,
}

impl NewPerson {
  /// Lowercased match key for the given name, derived on demand so it can
  /// never drift from `given`.
  pub fn norm_given(&self) -> Option<String> {
    self.given.as_deref().map(normalize_key)
  }

  /// Lowercased match key for the surname.
  pub fn norm_surname(&self) -> Option<String> {
    self.surname.as_deref().map(normalize_key)
  }

  /// Parsed birth year, if any.
  pub fn birth_year(&self) -> Option<i32> {
    self.birth.as_ref().and_then(|v| v.year)
  }
}

impl PersonRecord {
  pub fn birth_year(&self) -> Option<i32> {
    self.birth.as_ref().and_then(|v| v.year)
  }
}
