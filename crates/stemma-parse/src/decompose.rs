//! Entry decomposition: the marker-stripped body of a classified line is
//! split into a display name, birth/death vitals, an honorific title, the
//! trailing chart id, and leftover notes.

use std::sync::LazyLock;

use regex::Regex;
use stemma_core::{
  Vitals,
  text::{normalize_text, opt_str},
};

// ─── Patterns ────────────────────────────────────────────────────────────────

static VITALS_TAIL: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\(([^()]*)\)$").unwrap());

static YEAR: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

// Hedge words, tildes and question marks that mark a value as uncertain.
static APPROX: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?i)(?:\b(?:abt|about|around|circa|before|after)\b|\b(?:ca|bef|aft)\b\.?|\bc\.|~|\?)",
  )
  .unwrap()
});

// Fixed honorific vocabulary; longer alternatives first so "General" is not
// read as "Gen".
static TITLE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"\b(General|Deacon|Judge|Elder|Capt|Col|Maj|Rev|Sgt|Gen|Prof|Hon|Lady|Sir|Lt|Dr)\b\.?",
  )
  .unwrap()
});

// Trailing internal chart id, e.g. "Andrew NEWCOMB-117".
static ID_SUFFIX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"-\s*(\d+)$").unwrap());

static TRAILING_PAREN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\([^)]*\)$").unwrap());

// "b. 1640" / "b 1640" — a birth-only clause; likewise for death.
static BIRTH_ONLY: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)^b[\. ]\s*(.+)$").unwrap());
static DEATH_ONLY: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)^d[\. ]\s*(.+)$").unwrap());

// ─── Output type ─────────────────────────────────────────────────────────────

/// The decomposed body of one classified line.
#[derive(Debug, Clone, Default)]
pub struct Entry {
  pub display_name:     String,
  pub given:            Option<String>,
  pub surname:          Option<String>,
  /// True when `surname` came from the surname hint, not from the line.
  pub surname_inferred: bool,
  pub title:            Option<String>,
  pub birth:            Option<Vitals>,
  pub death:            Option<Vitals>,
  /// Trailing chart id digits, provenance only.
  pub chart_id:         Option<String>,
  /// `ID n` plus any inline note, `; `-joined.
  pub notes:            Option<String>,
  /// Line-level approximation: any approximate vital, hedge word or `?`.
  pub approx:           bool,
}

// ─── Approximation ───────────────────────────────────────────────────────────

/// True when `value` carries a hedge word, a question mark, or a bare
/// leading/trailing dash (a half-open range).
pub fn has_approx(value: &str) -> bool {
  let text = value.trim();
  if text.is_empty() {
    return false;
  }
  APPROX.is_match(text) || text.starts_with('-') || text.ends_with('-')
}

// ─── Vitals ──────────────────────────────────────────────────────────────────

fn looks_like_vital(content: &str) -> bool {
  if content.is_empty() {
    return false;
  }
  if YEAR.is_match(content) || APPROX.is_match(content) {
    return true;
  }
  if let Some((left, right)) = content.split_once('-') {
    return !left.trim().is_empty() || !right.trim().is_empty();
  }
  false
}

/// Split a vitals clause into `(birth, death, birth_missing,
/// death_missing)` raw sides.
fn split_vital_content(
  content: &str,
) -> (Option<String>, Option<String>, bool, bool) {
  if let Some(caps) = BIRTH_ONLY.captures(content) {
    return (opt_str(&caps[1]), None, false, false);
  }
  if let Some(caps) = DEATH_ONLY.captures(content) {
    return (None, opt_str(&caps[1]), false, false);
  }
  let Some((left, right)) = content.split_once('-') else {
    return (opt_str(content), None, false, false);
  };
  let left = left.trim();
  let right = right.trim();
  (
    opt_str(left),
    opt_str(right),
    left.is_empty(),
    right.is_empty(),
  )
}

fn make_vitals(raw: &str, force_approx: bool) -> Vitals {
  let cleaned = normalize_text(raw);
  let year = YEAR
    .captures(&cleaned)
    .and_then(|c| c[1].parse::<i32>().ok());
  Vitals {
    approx: force_approx || has_approx(raw),
    raw: cleaned,
    year,
  }
}

/// Strip trailing parenthesized vitals clauses off `body`, filling birth and
/// death on first sight. Returns the remaining display text.
fn parse_vitals(body: &str) -> (String, Option<Vitals>, Option<Vitals>) {
  let mut working = body.trim().to_string();
  let mut birth: Option<Vitals> = None;
  let mut death: Option<Vitals> = None;

  loop {
    let trimmed = working.trim_end();
    let Some(caps) = VITALS_TAIL.captures(trimmed) else {
      break;
    };
    let content = caps.get(1).unwrap().as_str().trim().to_string();
    if !looks_like_vital(&content) {
      break;
    }
    let remainder = trimmed[..caps.get(0).unwrap().start()]
      .trim_end()
      .to_string();
    working = remainder;

    let (birth_raw, death_raw, birth_missing, death_missing) =
      split_vital_content(&content);
    if let Some(raw) = birth_raw
      && birth.is_none()
    {
      birth = Some(make_vitals(&raw, death_missing));
    }
    if let Some(raw) = death_raw
      && death.is_none()
    {
      death = Some(make_vitals(&raw, birth_missing));
    }
  }

  (working, birth, death)
}

// ─── Titles, chart ids, notes ────────────────────────────────────────────────

/// Remove every honorific from `text`; returns the cleaned text and the
/// ordered, deduplicated titles joined with spaces.
fn extract_titles(text: &str) -> (String, Option<String>) {
  let mut titles: Vec<String> = Vec::new();
  let cleaned = TITLE.replace_all(text, |caps: &regex::Captures| {
    let t = caps[1].to_string();
    if !titles.contains(&t) {
      titles.push(t);
    }
    " ".to_string()
  });
  let cleaned = normalize_text(&cleaned);
  if titles.is_empty() {
    (cleaned, None)
  } else {
    (cleaned, Some(titles.join(" ")))
  }
}

fn extract_id_suffix(text: &str) -> (String, Option<String>) {
  let Some(caps) = ID_SUFFIX.captures(text) else {
    return (text.to_string(), None);
  };
  let id = caps[1].to_string();
  let cleaned = ID_SUFFIX
    .replace(text, "")
    .trim_matches([' ', ',', ';', ':', '-'])
    .to_string();
  (cleaned, Some(id))
}

const NOTE_SEPARATORS: [&str; 4] = [",", ";", " - ", ": "];

/// Split an inline note off the display text. Only a tail starting with a
/// lowercase letter is a note — anything else is part of the name.
fn split_display_and_notes(text: &str) -> (String, Option<String>) {
  let working = text.trim();
  for separator in NOTE_SEPARATORS {
    if let Some((head, tail)) = working.split_once(separator) {
      let head = head.trim();
      let tail = tail.trim();
      if tail.chars().next().is_some_and(|c| c.is_lowercase()) {
        return (head.to_string(), Some(tail.to_string()));
      }
    }
  }
  (working.to_string(), None)
}

// ─── Name split ──────────────────────────────────────────────────────────────

fn is_all_caps(token: &str) -> bool {
  let mut letters = 0;
  for c in token.chars() {
    if c.is_alphabetic() {
      if c.is_lowercase() {
        return false;
      }
      letters += 1;
    } else if c != '\'' && c != '-' {
      return false;
    }
  }
  letters >= 2
}

/// Split a display name into given and surname.
///
/// The ALL-CAPS run is the surname when present (the chart's convention);
/// otherwise the last token. A lone token has no extractable surname and
/// inherits the caller's hint, marked inferred.
fn split_name(
  display: &str,
  surname_hint: Option<&str>,
) -> (Option<String>, Option<String>, bool) {
  let work = TRAILING_PAREN.replace(display, "");
  let work = work.trim();

  // "SURNAME, Given" comma form.
  if let Some((head, tail)) = work.split_once(',') {
    let head = head.trim();
    if !head.is_empty() && head.split_whitespace().count() == 1 {
      let given_tokens: Vec<&str> = tail
        .split_whitespace()
        .filter(|t| *t != "?" && *t != ",")
        .collect();
      let given = if given_tokens.is_empty() {
        None
      } else {
        Some(given_tokens.join(" "))
      };
      return (given, Some(head.to_string()), false);
    }
  }

  let tokens: Vec<&str> = work
    .split_whitespace()
    .filter(|t| *t != "?" && *t != ",")
    .collect();

  // Last maximal run of ALL-CAPS tokens — "Mary VAN BUREN" keeps both.
  let mut run_end = tokens.len();
  while run_end > 0 && !is_all_caps(tokens[run_end - 1]) {
    run_end -= 1;
  }
  let mut run_start = run_end;
  while run_start > 0 && is_all_caps(tokens[run_start - 1]) {
    run_start -= 1;
  }
  if run_start < run_end && run_end - run_start < tokens.len() {
    let surname = tokens[run_start..run_end].join(" ");
    let given: Vec<&str> = tokens[..run_start]
      .iter()
      .chain(&tokens[run_end..])
      .copied()
      .collect();
    let given = if given.is_empty() {
      None
    } else {
      Some(given.join(" "))
    };
    return (given, Some(surname), false);
  }

  match tokens.len() {
    0 => (None, surname_hint.map(str::to_string), surname_hint.is_some()),
    1 => (
      Some(tokens[0].to_string()),
      surname_hint.map(str::to_string),
      surname_hint.is_some(),
    ),
    n => (
      Some(tokens[..n - 1].join(" ")),
      Some(tokens[n - 1].to_string()),
      false,
    ),
  }
}

// ─── Decomposition ───────────────────────────────────────────────────────────

/// Decompose the marker-stripped body of a classified line.
///
/// `surname_hint` is the nearest open ancestor's surname; it is only used
/// when the line itself has no extractable surname, and its use is recorded
/// in [`Entry::surname_inferred`].
pub fn decompose(body: &str, surname_hint: Option<&str>) -> Entry {
  let (remainder, birth, death) = parse_vitals(body);
  let normalized = normalize_text(&remainder);
  let (display, inline_note) = split_display_and_notes(&normalized);
  let (without_titles, title) = extract_titles(&display);
  let (display_name, chart_id) = extract_id_suffix(&without_titles);

  let mut notes_parts: Vec<String> = Vec::new();
  if let Some(id) = &chart_id {
    notes_parts.push(format!("ID {id}"));
  }
  if let Some(note) = inline_note {
    notes_parts.push(note);
  }
  let notes = if notes_parts.is_empty() {
    None
  } else {
    Some(notes_parts.join("; "))
  };

  let vitals_approx = birth.as_ref().is_some_and(|v| v.approx)
    || death.as_ref().is_some_and(|v| v.approx);
  let approx = vitals_approx || has_approx(body);

  let (given, surname, surname_inferred) =
    split_name(&display_name, surname_hint);

  Entry {
    display_name,
    given,
    surname,
    surname_inferred,
    title,
    birth,
    death,
    chart_id,
    notes,
    approx,
  }
}
