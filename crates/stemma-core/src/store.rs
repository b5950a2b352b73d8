//! The `ChartStore` trait.
//!
//! Implemented by storage backends (e.g. `stemma-store-sqlite`). The engine
//! depends on this abstraction, not on any concrete backend.
//!
//! All methods are synchronous: line processing within one source is
//! strictly in-order (the generation stack is order-sensitive), and the
//! lookup-before-insert pattern assumes the store is immediately consistent
//! within a run. Transaction and rollback ownership stays with the caller;
//! the engine never retries a failed storage call.

use uuid::Uuid;

use crate::{
  family::{ChildLink, FamilyRecord, NewChildLink, NewFamily},
  person::{NewPerson, PersonRecord},
};

/// Abstraction over a Stemma chart store backend.
///
/// Every key handed to the store is source-scoped; independent sources never
/// share records, so independent engine instances may drive independent
/// stores concurrently.
pub trait ChartStore {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── People ────────────────────────────────────────────────────────────

  /// Persist a new person. The store assigns `id` and `created_at`.
  fn insert_person(
    &self,
    input: NewPerson,
  ) -> Result<PersonRecord, Self::Error>;

  /// Write back a merged person record, matched by `id`.
  fn update_person(&self, person: &PersonRecord) -> Result<(), Self::Error>;

  /// Exact fingerprint lookup within one source.
  fn person_by_fingerprint(
    &self,
    source_id: Uuid,
    fingerprint: &str,
  ) -> Result<Option<PersonRecord>, Self::Error>;

  /// All people in a source with the given normalized surname, in
  /// first-seen (insertion) order — fuzzy-match ties break on that order.
  fn people_by_surname(
    &self,
    source_id: Uuid,
    norm_surname: &str,
  ) -> Result<Vec<PersonRecord>, Self::Error>;

  // ── Families ──────────────────────────────────────────────────────────

  fn insert_family(
    &self,
    input: NewFamily,
  ) -> Result<FamilyRecord, Self::Error>;

  fn update_family(&self, family: &FamilyRecord) -> Result<(), Self::Error>;

  /// The two-parent family for the canonicalized pair `(a, b)`, if any.
  /// Implementations must treat `(a, b)` and `(b, a)` identically.
  fn family_by_pair(
    &self,
    source_id: Uuid,
    a: Uuid,
    b: Uuid,
  ) -> Result<Option<FamilyRecord>, Self::Error>;

  /// The single-parent placeholder family whose only filled slot is
  /// `parent_id`, if any.
  fn single_parent_family(
    &self,
    source_id: Uuid,
    parent_id: Uuid,
  ) -> Result<Option<FamilyRecord>, Self::Error>;

  // ── Child links ───────────────────────────────────────────────────────

  fn insert_child_link(
    &self,
    input: NewChildLink,
  ) -> Result<ChildLink, Self::Error>;

  /// The link for `(family_id, person_id)`, if the child is already
  /// attached.
  fn child_link(
    &self,
    family_id: Uuid,
    person_id: Uuid,
  ) -> Result<Option<ChildLink>, Self::Error>;

  /// All links of a family, in ordinal order.
  fn child_links(
    &self,
    family_id: Uuid,
  ) -> Result<Vec<ChildLink>, Self::Error>;
}
