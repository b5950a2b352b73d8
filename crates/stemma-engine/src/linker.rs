//! Family and child-link upserts.
//!
//! Couples are canonicalized so (A, B) and (B, A) name the same family; a
//! single-parent placeholder upgrades in place when its spouse turns up.
//! Child links are idempotent on (family, person) and take the next dense
//! ordinal. Approximation only ever propagates toward `true`.

use stemma_core::{
  ChartStore, ChildLink, FamilyRecord, NewChildLink, NewFamily, Sex,
};
use uuid::Uuid;

/// A parent slot candidate: the id plus the recorded sex that decides which
/// slot it takes.
#[derive(Debug, Clone, Copy)]
pub struct Parent {
  pub id:  Uuid,
  pub sex: Option<Sex>,
}

/// Fill missing metadata on an existing family; returns true when the
/// record changed and needs writing back.
fn touch_family(
  family: &mut FamilyRecord,
  fingerprint: &str,
  approx: bool,
) -> bool {
  let mut changed = false;
  if family.fingerprint.is_none() {
    family.fingerprint = Some(fingerprint.to_string());
    changed = true;
  }
  if approx && !family.approx {
    family.approx = true;
    changed = true;
  }
  changed
}

/// Find or create the single-parent placeholder family for `parent`. The
/// parent takes the slot matching its recorded sex; the husband slot when
/// sex is unknown.
pub fn ensure_single_parent<S: ChartStore>(
  store: &S,
  source_id: Uuid,
  parent: Parent,
  fingerprint: &str,
  approx: bool,
  page_index: Option<usize>,
) -> Result<FamilyRecord, S::Error> {
  if let Some(mut family) = store.single_parent_family(source_id, parent.id)? {
    if touch_family(&mut family, fingerprint, approx) {
      store.update_family(&family)?;
    }
    return Ok(family);
  }
  let (husband_id, wife_id) = match parent.sex {
    Some(Sex::Female) => (None, Some(parent.id)),
    _ => (Some(parent.id), None),
  };
  store.insert_family(NewFamily {
    source_id,
    husband_id,
    wife_id,
    fingerprint: Some(fingerprint.to_string()),
    approx,
    page_index,
  })
}

/// Find or create the two-parent family for the unordered couple
/// `(principal, spouse)`.
///
/// Resolution order: the exact canonical pair; the principal's
/// single-parent placeholder, upgraded in place; a fresh two-parent family.
/// With `principal == spouse` this is a single-parent ensure.
pub fn upsert_couple<S: ChartStore>(
  store: &S,
  source_id: Uuid,
  principal: Parent,
  spouse: Parent,
  fingerprint: &str,
  approx: bool,
  page_index: Option<usize>,
) -> Result<FamilyRecord, S::Error> {
  if principal.id == spouse.id {
    return ensure_single_parent(
      store, source_id, principal, fingerprint, approx, page_index,
    );
  }

  if let Some(mut family) =
    store.family_by_pair(source_id, principal.id, spouse.id)?
  {
    if touch_family(&mut family, fingerprint, approx) {
      store.update_family(&family)?;
    }
    return Ok(family);
  }

  if let Some(mut family) =
    store.single_parent_family(source_id, principal.id)?
  {
    if family.husband_id.is_none() {
      family.husband_id = Some(spouse.id);
    } else {
      family.wife_id = Some(spouse.id);
    }
    touch_family(&mut family, fingerprint, approx);
    store.update_family(&family)?;
    return Ok(family);
  }

  let (husband_id, wife_id) = match (principal.sex, spouse.sex) {
    (Some(Sex::Female), _) | (None, Some(Sex::Male)) => {
      (Some(spouse.id), Some(principal.id))
    }
    _ => (Some(principal.id), Some(spouse.id)),
  };
  store.insert_family(NewFamily {
    source_id,
    husband_id,
    wife_id,
    fingerprint: Some(fingerprint.to_string()),
    approx,
    page_index,
  })
}

/// Attach `child` to `family`, idempotently. The new link's ordinal is one
/// past the family's current maximum. An approximate link also marks the
/// family approximate (never the reverse).
pub fn link_child<S: ChartStore>(
  store: &S,
  family: &mut FamilyRecord,
  child_id: Uuid,
  fingerprint: &str,
  approx: bool,
) -> Result<ChildLink, S::Error> {
  let link = match store.child_link(family.id, child_id)? {
    Some(existing) => existing,
    None => {
      let ordinal = store
        .child_links(family.id)?
        .iter()
        .map(|l| l.ordinal + 1)
        .max()
        .unwrap_or(0);
      store.insert_child_link(NewChildLink {
        family_id:   family.id,
        person_id:   child_id,
        ordinal,
        fingerprint: Some(fingerprint.to_string()),
        approx,
      })?
    }
  };
  if approx && !family.approx {
    family.approx = true;
    store.update_family(family)?;
  }
  Ok(link)
}
