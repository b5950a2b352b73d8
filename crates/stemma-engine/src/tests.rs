//! Scenario and property tests for the engine, run against the real SQLite
//! store on an in-memory database.

use stemma_core::{
  ChartStore, FlagReason, NewPerson, Sex, Vitals, canonical_pair,
};
use stemma_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{
  Engine, Page, RunStats,
  linker::{self, Parent},
  resolver,
};

fn store() -> SqliteStore {
  SqliteStore::open_in_memory().expect("in-memory store")
}

fn run(s: &SqliteStore, source: Uuid, pages: &[&str]) -> RunStats {
  let pages: Vec<Page> = pages
    .iter()
    .enumerate()
    .map(|(index, text)| Page::new(index, *text))
    .collect();
  Engine::new(s, source).run(&pages).expect("engine run")
}

fn given<'a>(
  people: &'a [stemma_core::PersonRecord],
  name: &str,
) -> &'a stemma_core::PersonRecord {
  people
    .iter()
    .find(|p| p.given.as_deref() == Some(name))
    .unwrap_or_else(|| panic!("no person with given name {name:?}"))
}

// ─── Scenario A: couple with one child ───────────────────────────────────────

#[test]
fn couple_with_child() {
  let s = store();
  let source = Uuid::new_v4();
  let stats = run(
    &s,
    source,
    &["1-- Andrew NEWCOMB Lt.-117 (1640-1706)\nsp-Sarah-118 (-1674)\n2-- Simon NEWCOMB-1761 (1662)"],
  );

  assert_eq!(stats.people, 3);
  assert_eq!(stats.families, 1);
  assert_eq!(stats.children, 1);
  assert!(stats.flagged.is_empty());

  let people = s.people(source).unwrap();
  let andrew = given(&people, "Andrew");
  let sarah = given(&people, "Sarah");
  let simon = given(&people, "Simon");
  assert_eq!(andrew.generation, 1);
  assert_eq!(andrew.title.as_deref(), Some("Lt"));
  assert_eq!(andrew.notes.as_deref(), Some("ID 117"));
  assert!(sarah.approx, "open-ended birth range");
  assert_eq!(simon.generation, 2);

  let families = s.families(source).unwrap();
  assert_eq!(families.len(), 1);
  assert!(families[0].is_two_parent());
  assert_eq!(
    families[0].parent_pair(),
    Some(canonical_pair(andrew.id, sarah.id))
  );
  assert!(families[0].approx, "spouse approximation reached the family");

  let links = s.child_links(families[0].id).unwrap();
  assert_eq!(links.len(), 1);
  assert_eq!(links[0].person_id, simon.id);
  assert_eq!(links[0].ordinal, 0);
}

// ─── Scenario B: lone root ───────────────────────────────────────────────────

#[test]
fn lone_root_creates_no_family() {
  let s = store();
  let source = Uuid::new_v4();
  let stats = run(&s, source, &["1-- Andrew NEWCOMB (1640-1706)"]);

  assert_eq!(stats.people, 1);
  assert_eq!(stats.families, 0);
  assert_eq!(stats.children, 0);
  assert!(s.families(source).unwrap().is_empty());
}

// ─── Scenario C: incremental equals whole ────────────────────────────────────

#[test]
fn incremental_parse_matches_whole() {
  const PAGE_0: &str =
    "1-- Andrew NEWCOMB (1640-1706)\nsp-Sarah (-1674)\n2-- Simon NEWCOMB (1662)";
  const PAGE_1: &str = "1-- George ROOT (1700)\n2-- Henry ROOT (1730)";

  let source = Uuid::new_v4();

  let whole = store();
  run(&whole, source, &[PAGE_0, PAGE_1]);

  let split = store();
  let engine = Engine::new(&split, source);
  engine.run(&[Page::new(0, PAGE_0)]).unwrap();
  engine.run(&[Page::new(1, PAGE_1)]).unwrap();

  let fingerprints = |s: &SqliteStore| {
    let mut keys: Vec<String> = s
      .people(source)
      .unwrap()
      .into_iter()
      .filter_map(|p| p.fingerprint)
      .collect();
    keys.sort();
    keys
  };
  assert_eq!(fingerprints(&whole), fingerprints(&split));
  assert_eq!(
    whole.people(source).unwrap().len(),
    split.people(source).unwrap().len()
  );
  assert_eq!(
    whole.families(source).unwrap().len(),
    split.families(source).unwrap().len()
  );
}

// ─── Idempotence ─────────────────────────────────────────────────────────────

#[test]
fn reprocessing_is_idempotent() {
  const TEXT: &str =
    "1-- Root PERSON (1650)\nsp-Partner ONE (1652)\n2-- Child PERSON (1680)";
  let s = store();
  let source = Uuid::new_v4();

  let first = run(&s, source, &[TEXT]);
  let people_before: Vec<_> = s.people(source).unwrap();
  let second = run(&s, source, &[TEXT]);

  assert_eq!(first.people, second.people);
  assert_eq!(first.families, second.families);
  assert_eq!(first.children, second.children);

  let people_after = s.people(source).unwrap();
  assert_eq!(people_before.len(), people_after.len());
  let keys = |people: &[stemma_core::PersonRecord]| {
    let mut k: Vec<_> =
      people.iter().filter_map(|p| p.fingerprint.clone()).collect();
    k.sort();
    k
  };
  assert_eq!(keys(&people_before), keys(&people_after));
}

// ─── Full chart structure ────────────────────────────────────────────────────

#[test]
fn newcomb_chart_structure() {
  let sample = "\
1-- Andrew NEWCOMB Lt.-117 (1640-1706)
sp-Sarah-118 (-1674)
2-- Simon NEWCOMB-1761 (1662)
2-- Andrew NEWCOMB-1762 (1664-1687)
2-- Simon NEWCOMB Lt.-115 (1665-1744)
sp-Deborah ?-116 (1664-1756)
3-- John NEWCOMB Deacon-1653 (1688-1765)
4-- Eddy NEWCOMB-1964
sp-Abigail ENGLISH-973 (1724)";

  let s = store();
  let source = Uuid::new_v4();
  let stats = run(&s, source, &[sample]);

  assert_eq!(stats.people, 9);
  assert_eq!(stats.families, 4);
  assert_eq!(stats.children, 5);

  let people = s.people(source).unwrap();
  let families = s.families(source).unwrap();

  let andrew = given(&people, "Andrew");
  assert_eq!(andrew.generation, 1);
  assert_eq!(andrew.title.as_deref(), Some("Lt"));
  assert_eq!(andrew.birth.as_ref().and_then(|v| v.year), Some(1640));

  let sarah = given(&people, "Sarah");
  assert!(sarah.approx);
  let root_family = families
    .iter()
    .find(|f| f.parent_pair() == Some(canonical_pair(andrew.id, sarah.id)))
    .expect("Andrew+Sarah family");

  // The three generation-2 children, in document order.
  let links = s.child_links(root_family.id).unwrap();
  let children: Vec<(Option<i32>, Option<i32>)> = links
    .iter()
    .map(|l| {
      let p = people.iter().find(|p| p.id == l.person_id).unwrap();
      (
        p.birth.as_ref().and_then(|v| v.year),
        p.death.as_ref().and_then(|v| v.year),
      )
    })
    .collect();
  assert_eq!(
    children,
    vec![
      (Some(1662), None),
      (Some(1664), Some(1687)),
      (Some(1665), Some(1744)),
    ]
  );

  // The two Simons stayed distinct: same name, birth years three apart.
  let simons: Vec<_> = people
    .iter()
    .filter(|p| p.given.as_deref() == Some("Simon"))
    .collect();
  assert_eq!(simons.len(), 2);

  let deborah = given(&people, "Deborah");
  assert!(deborah.approx);
  assert!(deborah.notes.as_deref().is_some_and(|n| n.contains("ID 116")));

  let simon_lt = simons
    .iter()
    .find(|p| p.birth.as_ref().and_then(|v| v.year) == Some(1665))
    .unwrap();
  let simon_family = families
    .iter()
    .find(|f| f.parent_pair() == Some(canonical_pair(simon_lt.id, deborah.id)))
    .expect("Simon+Deborah family");
  assert!(simon_family.approx);

  let john = given(&people, "John");
  assert_eq!(john.generation, 3);
  assert_eq!(john.title.as_deref(), Some("Deacon"));
  assert!(
    s.child_links(simon_family.id)
      .unwrap()
      .iter()
      .any(|l| l.person_id == john.id)
  );

  let eddy = given(&people, "Eddy");
  assert_eq!(eddy.generation, 4);
  assert_eq!(eddy.surname.as_deref(), Some("NEWCOMB"));
  assert!(!eddy.surname_inferred);

  let abigail = given(&people, "Abigail");
  assert_eq!(abigail.birth.as_ref().and_then(|v| v.year), Some(1724));
  assert!(
    families
      .iter()
      .any(|f| f.parent_pair() == Some(canonical_pair(eddy.id, abigail.id)))
  );
}

// ─── Spouse policy ───────────────────────────────────────────────────────────

#[test]
fn spouse_attaches_to_innermost_context() {
  let s = store();
  let source = Uuid::new_v4();
  run(
    &s,
    source,
    &["1-- George ROOT\n2-- Henry ROOT\nsp-Clara SMITH\n2-- Mary ROOT"],
  );

  let people = s.people(source).unwrap();
  let henry = given(&people, "Henry");
  let clara = given(&people, "Clara");

  let families = s.families(source).unwrap();
  let clara_families: Vec<_> = families
    .iter()
    .filter(|f| f.husband_id == Some(clara.id) || f.wife_id == Some(clara.id))
    .collect();
  assert_eq!(clara_families.len(), 1);
  assert_eq!(
    clara_families[0].parent_pair(),
    Some(canonical_pair(henry.id, clara.id))
  );

  // Henry and Mary both hang off George's single-parent family.
  let george = given(&people, "George");
  let george_family = families
    .iter()
    .find(|f| f.sole_parent() == Some(george.id))
    .expect("George's placeholder family");
  let links = s.child_links(george_family.id).unwrap();
  assert_eq!(links.len(), 2);
}

#[test]
fn orphan_spouse_is_flagged_not_attached() {
  let s = store();
  let source = Uuid::new_v4();
  let stats = run(&s, source, &["sp-Widow SMITH (1700)"]);

  assert_eq!(stats.people, 0);
  assert_eq!(stats.families, 0);
  assert_eq!(stats.flagged.len(), 1);
  assert_eq!(stats.flagged[0].reason, FlagReason::OrphanSpouse);
}

// ─── Flagging ────────────────────────────────────────────────────────────────

#[test]
fn bad_generation_token_skips_line() {
  let s = store();
  let source = Uuid::new_v4();
  let stats = run(&s, source, &["140275-- John DOE (1800)"]);

  assert_eq!(stats.people, 0);
  assert_eq!(stats.flagged.len(), 1);
  assert_eq!(stats.flagged[0].reason, FlagReason::BadGenerationToken);
}

#[test]
fn scribbled_generation_marker_still_parses() {
  let s = store();
  let source = Uuid::new_v4();
  let stats = run(
    &s,
    source,
    &["x 1-- Andrew NEWCOMB (1640-1706)\nsp-Sarah (?-?)\n2-- Simon NEWCOMB (1662)"],
  );

  assert_eq!(stats.people, 3);
  let people = s.people(source).unwrap();
  assert_eq!(given(&people, "Andrew").generation, 1);
  assert_eq!(given(&people, "Sarah").generation, 1);
  assert_eq!(given(&people, "Simon").generation, 2);
}

#[test]
fn question_marks_propagate_approx_everywhere() {
  let s = store();
  let source = Uuid::new_v4();
  run(
    &s,
    source,
    &["1-- Mystery DOE (? Johnson) (1790-?)\nsp-Partner ?- (1800)\n2-- Descendant DOE (? ) (abt 1825)"],
  );

  let people = s.people(source).unwrap();
  assert!(!people.is_empty());
  for person in &people {
    assert!(person.approx, "{:?} should be approximate", person.display_name);
  }

  let families = s.families(source).unwrap();
  assert_eq!(families.len(), 1);
  assert!(families[0].approx);

  let links = s.child_links(families[0].id).unwrap();
  assert_eq!(links.len(), 1);
  assert!(links[0].approx);
}

// ─── Surname inheritance ─────────────────────────────────────────────────────

#[test]
fn lone_given_inherits_ancestor_surname_flagged() {
  let s = store();
  let source = Uuid::new_v4();
  run(&s, source, &["1-- George ROOT (1700)\n2-- Henry (1730)"]);

  let people = s.people(source).unwrap();
  let henry = given(&people, "Henry");
  assert_eq!(henry.surname.as_deref(), Some("ROOT"));
  assert!(henry.surname_inferred);
  assert_eq!(henry.norm_surname.as_deref(), Some("root"));

  let george = given(&people, "George");
  assert!(!george.surname_inferred);
}

// ─── Ordinals ────────────────────────────────────────────────────────────────

#[test]
fn ordinals_are_dense_and_reprocessing_stable() {
  const TEXT: &str = "\
1-- Thomas NEWCOMB (1640)
2-- Simon NEWCOMB (1662)
2-- Joseph NEWCOMB (1667)
2-- Hannah NEWCOMB (1670)";
  let s = store();
  let source = Uuid::new_v4();
  run(&s, source, &[TEXT]);
  run(&s, source, &[TEXT]);

  let families = s.families(source).unwrap();
  assert_eq!(families.len(), 1);
  let mut ordinals: Vec<u32> = s
    .child_links(families[0].id)
    .unwrap()
    .iter()
    .map(|l| l.ordinal)
    .collect();
  ordinals.sort_unstable();
  assert_eq!(ordinals, vec![0, 1, 2]);
}

// ─── Fuzzy resolution ────────────────────────────────────────────────────────

fn sighting(
  source_id: Uuid,
  given: &str,
  surname: &str,
  birth_year: Option<i32>,
  fingerprint: &str,
) -> NewPerson {
  NewPerson {
    source_id,
    generation: 1,
    display_name: format!("{given} {surname}"),
    given: Some(given.to_string()),
    surname: Some(surname.to_string()),
    surname_inferred: false,
    title: None,
    sex: None,
    birth: birth_year.map(|year| Vitals {
      raw:    year.to_string(),
      year:   Some(year),
      approx: false,
    }),
    death: None,
    notes: None,
    chart_id: None,
    fingerprint: Some(fingerprint.to_string()),
    page_index: Some(0),
    line_index: Some(0),
    approx: false,
  }
}

#[test]
fn fuzzy_merges_at_edit_distance_two_and_year_gap_two() {
  let s = store();
  let source = Uuid::new_v4();
  let first = resolver::resolve_person(
    &s,
    sighting(source, "Andrew", "NEWCOMB", Some(1700), "fp-1"),
  )
  .unwrap();
  let second = resolver::resolve_person(
    &s,
    sighting(source, "Andw", "NEWCOMB", Some(1702), "fp-2"),
  )
  .unwrap();
  assert_eq!(first.id, second.id);
  assert_eq!(s.people(source).unwrap().len(), 1);
}

#[test]
fn fuzzy_rejects_edit_distance_three_without_phonetic_match() {
  let s = store();
  let source = Uuid::new_v4();
  let first = resolver::resolve_person(
    &s,
    sighting(source, "Andrew", "NEWCOMB", Some(1700), "fp-1"),
  )
  .unwrap();
  let second = resolver::resolve_person(
    &s,
    sighting(source, "Anw", "NEWCOMB", Some(1700), "fp-2"),
  )
  .unwrap();
  assert_ne!(first.id, second.id);
  assert_eq!(s.people(source).unwrap().len(), 2);
}

#[test]
fn phonetic_match_bridges_wide_edit_distance() {
  let s = store();
  let source = Uuid::new_v4();
  let first = resolver::resolve_person(
    &s,
    sighting(source, "Meaghann", "NEWCOMB", Some(1800), "fp-1"),
  )
  .unwrap();
  let second = resolver::resolve_person(
    &s,
    sighting(source, "Megan", "NEWCOMB", Some(1800), "fp-2"),
  )
  .unwrap();
  assert_eq!(first.id, second.id);
}

#[test]
fn fuzzy_rejects_birth_years_more_than_two_apart() {
  let s = store();
  let source = Uuid::new_v4();
  let first = resolver::resolve_person(
    &s,
    sighting(source, "Simon", "NEWCOMB", Some(1662), "fp-1"),
  )
  .unwrap();
  let second = resolver::resolve_person(
    &s,
    sighting(source, "Simon", "NEWCOMB", Some(1665), "fp-2"),
  )
  .unwrap();
  assert_ne!(first.id, second.id);
}

#[test]
fn merge_is_additive_never_clearing() {
  let s = store();
  let source = Uuid::new_v4();
  resolver::resolve_person(
    &s,
    sighting(source, "Andrew", "NEWCOMB", Some(1700), "fp-1"),
  )
  .unwrap();

  let mut second = sighting(source, "Andrew", "NEWCOMB", None, "fp-1");
  second.title = Some("Lt".to_string());
  second.death = Some(Vitals {
    raw:    "1750".to_string(),
    year:   Some(1750),
    approx: true,
  });
  second.approx = true;
  second.given = None; // must not clear the recorded given name
  let merged = resolver::resolve_person(&s, second).unwrap();

  assert_eq!(merged.given.as_deref(), Some("Andrew"));
  assert_eq!(merged.title.as_deref(), Some("Lt"));
  assert_eq!(merged.birth.as_ref().and_then(|v| v.year), Some(1700));
  assert_eq!(merged.death.as_ref().and_then(|v| v.year), Some(1750));
  assert!(merged.approx, "approximate death marked the record");
}

#[test]
fn engine_merges_ocr_variant_sightings() {
  let s = store();
  let source = Uuid::new_v4();
  let stats = run(
    &s,
    source,
    &["1-- Andrew NEWCOMB (1700)", "1-- Andrw NEWCOMB (1700)"],
  );
  assert_eq!(stats.people, 1);
  assert_eq!(s.people(source).unwrap().len(), 1);
}

// ─── Linker properties ───────────────────────────────────────────────────────

fn inserted_parent(s: &SqliteStore, source: Uuid, sex: Option<Sex>) -> Parent {
  let mut input = sighting(source, "Parent", "DOE", None, &Uuid::new_v4().to_string());
  input.sex = sex;
  let record = s.insert_person(input).unwrap();
  Parent {
    id: record.id,
    sex: record.sex,
  }
}

#[test]
fn upsert_couple_is_order_independent() {
  let s = store();
  let source = Uuid::new_v4();
  let a = inserted_parent(&s, source, Some(Sex::Male));
  let b = inserted_parent(&s, source, Some(Sex::Female));

  let ab = linker::upsert_couple(&s, source, a, b, "key-1", false, None).unwrap();
  let ba = linker::upsert_couple(&s, source, b, a, "key-2", false, None).unwrap();
  assert_eq!(ab.id, ba.id);
  assert_eq!(s.families(source).unwrap().len(), 1);
}

#[test]
fn couple_upgrades_single_parent_in_place() {
  let s = store();
  let source = Uuid::new_v4();
  let parent = inserted_parent(&s, source, None);
  let spouse = inserted_parent(&s, source, None);

  let placeholder =
    linker::ensure_single_parent(&s, source, parent, "key-1", false, None)
      .unwrap();
  assert!(!placeholder.is_two_parent());

  let upgraded =
    linker::upsert_couple(&s, source, parent, spouse, "key-2", false, None)
      .unwrap();
  assert_eq!(upgraded.id, placeholder.id);
  assert!(upgraded.is_two_parent());
  assert_eq!(s.families(source).unwrap().len(), 1);
}

#[test]
fn single_parent_slot_follows_sex() {
  let s = store();
  let source = Uuid::new_v4();
  let mother = inserted_parent(&s, source, Some(Sex::Female));
  let family =
    linker::ensure_single_parent(&s, source, mother, "key-1", false, None)
      .unwrap();
  assert_eq!(family.wife_id, Some(mother.id));
  assert_eq!(family.husband_id, None);

  let unknown = inserted_parent(&s, source, None);
  let family =
    linker::ensure_single_parent(&s, source, unknown, "key-2", false, None)
      .unwrap();
  assert_eq!(family.husband_id, Some(unknown.id));
}

#[test]
fn approx_propagates_monotonically() {
  let s = store();
  let source = Uuid::new_v4();
  let parent = inserted_parent(&s, source, None);

  let mut family =
    linker::ensure_single_parent(&s, source, parent, "key-1", false, None)
      .unwrap();
  assert!(!family.approx);

  let child = inserted_parent(&s, source, None);
  linker::link_child(&s, &mut family, child.id, "link-1", true).unwrap();
  assert!(family.approx);

  // A later clean operation never clears the flag.
  let other = inserted_parent(&s, source, None);
  linker::link_child(&s, &mut family, other.id, "link-2", false).unwrap();
  assert!(family.approx);

  let fetched =
    linker::ensure_single_parent(&s, source, parent, "key-1", false, None)
      .unwrap();
  assert_eq!(fetched.id, family.id);
  assert!(fetched.approx);
}

#[test]
fn self_couple_collapses_to_single_parent() {
  let s = store();
  let source = Uuid::new_v4();
  let parent = inserted_parent(&s, source, None);
  let family =
    linker::upsert_couple(&s, source, parent, parent, "key-1", false, None)
      .unwrap();
  assert!(!family.is_two_parent());
  assert_eq!(family.sole_parent(), Some(parent.id));
}

// ─── Progress callback ───────────────────────────────────────────────────────

#[test]
fn progress_reports_every_line() {
  let s = store();
  let source = Uuid::new_v4();
  let pages = [Page::new(
    0,
    "1-- Andrew NEWCOMB (1640)\nsp-Sarah (1645)\n2-- Simon NEWCOMB (1662)",
  )];
  let mut calls = Vec::new();
  Engine::new(&s, source)
    .run_with_progress(&pages, |done, total| calls.push((done, total)))
    .unwrap();
  assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
}
