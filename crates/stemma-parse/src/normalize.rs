//! Page-level cleanup: running-header removal, hyphen-wrap rejoining, and
//! re-segmentation of physical lines that OCR merged across record
//! boundaries.

use std::sync::LazyLock;

use regex::Regex;
use stemma_core::text::normalize_text;

// ─── Running headers ─────────────────────────────────────────────────────────

static HEADER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  vec![
    // bare page number
    Regex::new(r"^\d{1,4}$").unwrap(),
    Regex::new(r"(?i)^page\s+\d+(\s+of\s+\d+)?$").unwrap(),
    // month/year banner, e.g. "January 1998"
    Regex::new(
      r"(?i)^(january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{4}$",
    )
    .unwrap(),
    // chart title lines
    Regex::new(r"(?i)^descendants\s+of\b").unwrap(),
    Regex::new(r"(?i)^descendancy\s+chart\b").unwrap(),
  ]
});

pub(crate) fn is_running_header(line: &str) -> bool {
  HEADER_PATTERNS.iter().any(|p| p.is_match(line))
}

// ─── Hyphen-wrapped word breaks ──────────────────────────────────────────────

/// True when `line` ends with a letter followed by a dash — the print
/// convention for a word wrapped onto the next physical line.
fn ends_with_word_break(line: &str) -> bool {
  let mut chars = line.chars().rev();
  matches!(
    (chars.next(), chars.next()),
    (Some('-'), Some(prev)) if prev.is_alphabetic()
  )
}

// ─── Mid-line marker re-segmentation ─────────────────────────────────────────

// A digit run followed by the person double-dash, anywhere in the line.
static MID_PERSON: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(\d+)\s?--").unwrap());

// A spouse marker preceded by whitespace.
static MID_SPOUSE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\s[sS5$][pP]-").unwrap());

/// Split one physical line at every embedded record marker.
///
/// The first returned segment may be a marker-less prefix fragment; it
/// belongs to the previous logical line. A marker glued to a preceding
/// chart id (`MUNSON-14027--`) is cut so that the id digits stay with the
/// left fragment and only the trailing 1–2 generation digits start the new
/// segment (the last two only when they read 10, 11 or 12).
pub(crate) fn resegment(line: &str) -> Vec<String> {
  let bytes = line.as_bytes();
  let mut cuts: Vec<usize> = Vec::new();

  for caps in MID_PERSON.captures_iter(line) {
    let digits = caps.get(1).unwrap();
    let start = digits.start();
    let preceded_by_space =
      start == 0 || bytes[start - 1].is_ascii_whitespace();
    if preceded_by_space {
      if start > 0 {
        cuts.push(start);
      }
    } else if digits.len() >= 3 {
      // id digits glued to the marker: keep all but the generation digits
      // on the left
      let d = digits.as_str();
      let keep = match &d[d.len() - 2..] {
        "10" | "11" | "12" => 2,
        _ => 1,
      };
      cuts.push(digits.end() - keep);
    }
  }
  for m in MID_SPOUSE.find_iter(line) {
    cuts.push(m.start() + 1); // cut after the whitespace
  }

  if cuts.is_empty() {
    return vec![line.to_string()];
  }
  cuts.sort_unstable();
  cuts.dedup();

  let mut segments = Vec::with_capacity(cuts.len() + 1);
  let mut start = 0usize;
  for cut in cuts {
    if cut > start {
      let seg = line[start..cut].trim();
      if !seg.is_empty() {
        segments.push(seg.to_string());
      }
      start = cut;
    }
  }
  let tail = line[start..].trim();
  if !tail.is_empty() {
    segments.push(tail.to_string());
  }
  segments
}

// ─── Page assembly ───────────────────────────────────────────────────────────

/// Normalize a page into `(line_index, text)` pairs with headers removed
/// and hyphen-wrapped words rejoined. `line_index` is the index of the
/// first physical line each entry came from.
pub(crate) fn page_lines(text: &str) -> Vec<(usize, String)> {
  let mut cleaned: Vec<(usize, String)> = Vec::new();
  for (line_index, raw) in text.lines().enumerate() {
    let line = normalize_text(raw);
    if line.is_empty() || is_running_header(&line) {
      continue;
    }
    // Rejoin a word wrapped with a trailing dash onto the previous line.
    if let Some((_, prev)) = cleaned.last_mut()
      && ends_with_word_break(prev)
      && line.chars().next().is_some_and(|c| c.is_lowercase())
    {
      prev.pop();
      prev.push_str(&line);
      continue;
    }
    cleaned.push((line_index, line));
  }
  cleaned
}
