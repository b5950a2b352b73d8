//! Family and child-link records.
//!
//! A family with both parent slots filled is a couple; with one slot filled
//! it is a single-parent placeholder that upgrades in place when a spouse
//! attaches. Children hang off a family via [`ChildLink`] rows with dense
//! insertion-order ordinals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Canonical pair ──────────────────────────────────────────────────────────

/// Normalize an unordered couple to one fixed order so that (A, B) and
/// (B, A) always name the same family.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
  if a <= b { (a, b) } else { (b, a) }
}

// ─── FamilyRecord ────────────────────────────────────────────────────────────

/// A persisted family. Parent slots are conventional: sex decides slot
/// assignment when known, otherwise the principal takes the husband slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyRecord {
  pub id:          Uuid,
  pub source_id:   Uuid,
  pub husband_id:  Option<Uuid>,
  pub wife_id:     Option<Uuid>,
  pub fingerprint: Option<String>,
  /// Monotonic: set by any approximate input, never cleared.
  pub approx:      bool,
  pub page_index:  Option<usize>,
  pub created_at:  DateTime<Utc>,
}

impl FamilyRecord {
  pub fn is_two_parent(&self) -> bool {
    self.husband_id.is_some() && self.wife_id.is_some()
  }

  /// The canonically ordered parent pair, when both slots are filled.
  pub fn parent_pair(&self) -> Option<(Uuid, Uuid)> {
    match (self.husband_id, self.wife_id) {
      (Some(h), Some(w)) => Some(canonical_pair(h, w)),
      _ => None,
    }
  }

  /// The parent of a single-parent family, when exactly one slot is filled.
  pub fn sole_parent(&self) -> Option<Uuid> {
    match (self.husband_id, self.wife_id) {
      (Some(h), None) => Some(h),
      (None, Some(w)) => Some(w),
      _ => None,
    }
  }
}

/// Input to [`crate::store::ChartStore::insert_family`].
#[derive(Debug, Clone)]
pub struct NewFamily {
  pub source_id:   Uuid,
  pub husband_id:  Option<Uuid>,
  pub wife_id:     Option<Uuid>,
  pub fingerprint: Option<String>,
  pub approx:      bool,
  pub page_index:  Option<usize>,
}

// ─── ChildLink ───────────────────────────────────────────────────────────────

/// Membership of a child person in a family. `(family_id, person_id)` is
/// unique; ordinals within a family are exactly `0..n`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildLink {
  pub id:          Uuid,
  pub family_id:   Uuid,
  pub person_id:   Uuid,
  pub ordinal:     u32,
  pub fingerprint: Option<String>,
  pub approx:      bool,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::ChartStore::insert_child_link`].
#[derive(Debug, Clone)]
pub struct NewChildLink {
  pub family_id:   Uuid,
  pub person_id:   Uuid,
  pub ordinal:     u32,
  pub fingerprint: Option<String>,
  pub approx:      bool,
}
