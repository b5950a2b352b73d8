//! Person entity resolution.
//!
//! OCR on period charts corrupts individual characters but rarely invents
//! an unrelated name or year, so after the exact fingerprint check the
//! resolver falls back to bounded edit-distance and phonetic matching
//! within the same surname, with a birth-year tolerance gate against
//! merging distinct same-name relatives.

use stemma_core::{ChartStore, NewPerson, PersonRecord, text::normalize_key};
use tracing::debug;

/// Maximum edit distance between normalized given names for a fuzzy match.
const MAX_GIVEN_EDIT_DISTANCE: usize = 2;

/// Maximum difference between parsed birth years before a candidate is
/// rejected outright.
const MAX_BIRTH_YEAR_DELTA: i32 = 2;

/// Resolve a sighting to a person record.
///
/// Policy, in order: exact fingerprint match within the source; fuzzy match
/// restricted to the same normalized surname (first-seen candidate order);
/// otherwise a fresh insert. Matches are enriched by additive merge — a
/// populated field is never overwritten by an empty one.
pub fn resolve_person<S: ChartStore>(
  store: &S,
  input: NewPerson,
) -> Result<PersonRecord, S::Error> {
  if let Some(fingerprint) = input.fingerprint.as_deref()
    && let Some(mut existing) =
      store.person_by_fingerprint(input.source_id, fingerprint)?
  {
    if merge_into(&mut existing, &input) {
      store.update_person(&existing)?;
    }
    return Ok(existing);
  }

  if let Some(norm_surname) = input.norm_surname() {
    let candidates = store.people_by_surname(input.source_id, &norm_surname)?;
    let given = input.norm_given().unwrap_or_default();
    let birth_year = input.birth_year();
    for mut candidate in candidates {
      if !is_fuzzy_match(&given, birth_year, &candidate) {
        continue;
      }
      debug!(
        candidate = %candidate.display_name,
        sighting = %input.display_name,
        "fuzzy-matched person sighting"
      );
      if merge_into(&mut candidate, &input) {
        store.update_person(&candidate)?;
      }
      return Ok(candidate);
    }
  }

  store.insert_person(input)
}

fn is_fuzzy_match(
  given: &str,
  birth_year: Option<i32>,
  candidate: &PersonRecord,
) -> bool {
  let candidate_given = candidate.norm_given.as_deref().unwrap_or_default();
  let name_match = match (given.is_empty(), candidate_given.is_empty()) {
    // Two given-less sightings of the same surname are the same person;
    // a given-less sighting never merges with a named one.
    (true, true) => true,
    (false, false) => {
      strsim::levenshtein(given, candidate_given) <= MAX_GIVEN_EDIT_DISTANCE
        || soundex(given) == soundex(candidate_given)
    }
    _ => false,
  };
  if !name_match {
    return false;
  }
  match (birth_year, candidate.birth_year()) {
    (Some(a), Some(b)) => (a - b).abs() <= MAX_BIRTH_YEAR_DELTA,
    _ => true,
  }
}

// ─── Additive merge ──────────────────────────────────────────────────────────

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) -> bool {
  if slot.is_none() && value.is_some() {
    *slot = value.clone();
    return true;
  }
  false
}

/// Merge a later sighting into an existing record. Returns true when any
/// field changed. Populated fields are never cleared or replaced, with one
/// exception: a surname that was merely inferred from an ancestor yields to
/// one actually read off a line.
fn merge_into(existing: &mut PersonRecord, input: &NewPerson) -> bool {
  let mut changed = false;

  if fill(&mut existing.given, &input.given) {
    existing.norm_given = existing.given.as_deref().map(normalize_key);
    changed = true;
  }
  if let Some(surname) = &input.surname {
    let upgrade = existing.surname_inferred && !input.surname_inferred;
    if existing.surname.is_none() || upgrade {
      existing.surname = Some(surname.clone());
      existing.norm_surname = Some(normalize_key(surname));
      existing.surname_inferred = input.surname_inferred;
      changed = true;
    }
  }
  changed |= fill(&mut existing.title, &input.title);
  changed |= fill(&mut existing.sex, &input.sex);
  changed |= fill(&mut existing.notes, &input.notes);
  changed |= fill(&mut existing.chart_id, &input.chart_id);
  changed |= fill(&mut existing.fingerprint, &input.fingerprint);
  changed |= merge_vitals(&mut existing.birth, &input.birth);
  changed |= merge_vitals(&mut existing.death, &input.death);

  if existing.display_name.is_empty() && !input.display_name.is_empty() {
    existing.display_name = input.display_name.clone();
    changed = true;
  }
  if input.approx && !existing.approx {
    existing.approx = true;
    changed = true;
  }
  changed
}

fn merge_vitals(
  slot: &mut Option<stemma_core::Vitals>,
  value: &Option<stemma_core::Vitals>,
) -> bool {
  match (slot.as_mut(), value) {
    (None, Some(v)) => {
      *slot = Some(v.clone());
      true
    }
    (Some(existing), Some(v)) => {
      let mut changed = false;
      if existing.year.is_none() && v.year.is_some() {
        existing.year = v.year;
        changed = true;
      }
      if v.approx && !existing.approx {
        existing.approx = true;
        changed = true;
      }
      changed
    }
    _ => false,
  }
}

// ─── Soundex ─────────────────────────────────────────────────────────────────

fn consonant_code(c: char) -> Option<char> {
  match c {
    'b' | 'f' | 'p' | 'v' => Some('1'),
    'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
    'd' | 't' => Some('3'),
    'l' => Some('4'),
    'm' | 'n' => Some('5'),
    'r' => Some('6'),
    _ => None,
  }
}

/// American Soundex of `name`; empty input yields an empty code.
pub fn soundex(name: &str) -> String {
  let letters: Vec<char> = name
    .chars()
    .filter(char::is_ascii_alphabetic)
    .map(|c| c.to_ascii_lowercase())
    .collect();
  let Some(&first) = letters.first() else {
    return String::new();
  };

  let mut code = String::with_capacity(4);
  code.push(first.to_ascii_uppercase());
  let mut last = consonant_code(first);
  for &c in &letters[1..] {
    match consonant_code(c) {
      Some(digit) => {
        if last != Some(digit) {
          code.push(digit);
          if code.len() == 4 {
            break;
          }
        }
        last = Some(digit);
      }
      // 'h' and 'w' are transparent: a repeated code across them still
      // collapses. Vowels break the run.
      None if c == 'h' || c == 'w' => {}
      None => last = None,
    }
  }
  while code.len() < 4 {
    code.push('0');
  }
  code
}
