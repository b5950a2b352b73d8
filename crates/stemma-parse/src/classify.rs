//! Logical-line classification: person lines, spouse lines, and the noise
//! in between.
//!
//! Generation tokens arrive corrupted more often than not — letter/digit
//! confusion, stray digits bled in from an adjacent chart id, scribbles in
//! the margin. Repair is bounded: a fixed substitution set, the
//! last-1-or-2-digit truncation rule, and a hard width limit past which a
//! token is flagged rather than guessed at.

use std::sync::LazyLock;

use regex::Regex;
use stemma_core::{FlagReason, FlaggedLine, text::normalize_text};

use crate::normalize::{page_lines, resegment};

// ─── Output types ────────────────────────────────────────────────────────────

/// Classification of one logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
  /// A numbered descendant line at the given tree depth.
  Person { generation: u32 },
  /// A spouse line; attaches to the innermost open person context.
  Spouse,
}

/// One classified logical line with provenance.
#[derive(Debug, Clone)]
pub struct LogicalLine {
  pub page_index: usize,
  /// Index of the first physical line this logical line came from.
  pub line_index: usize,
  /// The normalized segment text as classified, marker included.
  pub raw:        String,
  pub kind:       LineKind,
  /// Marker-stripped body, input to the decomposer.
  pub body:       String,
}

/// Everything extracted from one page.
#[derive(Debug, Clone, Default)]
pub struct PageScan {
  pub lines:   Vec<LogicalLine>,
  pub flagged: Vec<FlaggedLine>,
}

// ─── Marker patterns ─────────────────────────────────────────────────────────

// Generation token + double dash, with tolerance for a short scribble
// prefix ("x ", "* ") and for OCR confusables inside the token itself.
static PERSON_LINE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\s*(?:[a-z*.)\]]{1,2}\s+)?([0-9OoIlL|{\\]{1,8})\s*--\s*(.+)$")
    .unwrap()
});

// Numeral or roman-numeral token followed by a period ("3. ", "II. ").
static PERSON_DOT_LINE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\s*(\d{1,3}|[IVXivx]{1,5})\.\s+(.+)$").unwrap()
});

static SPOUSE_LINE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\s*[sS5$] ?[pP]\s*-\s*(.+)$").unwrap());

// ─── Generation-token repair ─────────────────────────────────────────────────

/// Width past which a token cannot be a generation number with id digits
/// bled in; such lines are flagged, never guessed at.
const MAX_TOKEN_WIDTH: usize = 4;

/// Normalize a corrupted generation token to an integer.
///
/// Substitutions cover the confusions this corpus actually produces
/// (`l`/`I`/`L`/`|`→1, `O`/`o`→0, `{`→1, `\`→1). A token of 3–4 digits keeps
/// only its trailing 1–2 digits: the rest are chart-id digits OCR merged in.
/// The trailing two digits win only when they read 10, 11 or 12 — deeper
/// charts than that do not occur.
pub(crate) fn repair_generation_token(token: &str) -> Option<u32> {
  if token.is_empty() || token.len() > MAX_TOKEN_WIDTH {
    return None;
  }
  let digits: String = token
    .chars()
    .map(|c| match c {
      'l' | 'I' | 'L' | '|' | '{' | '\\' => '1',
      'O' | 'o' => '0',
      c => c,
    })
    .collect();
  if !digits.chars().all(|c| c.is_ascii_digit()) {
    return None;
  }
  let trimmed = if digits.len() >= 3 {
    match &digits[digits.len() - 2..] {
      tail @ ("10" | "11" | "12") => tail,
      _ => &digits[digits.len() - 1..],
    }
  } else {
    digits.as_str()
  };
  match trimmed.parse::<u32>() {
    Ok(0) | Err(_) => None,
    Ok(g) => Some(g),
  }
}

fn parse_roman(token: &str) -> Option<u32> {
  let mut total = 0i64;
  let mut prev = 0i64;
  for c in token.chars().rev() {
    let v = match c.to_ascii_uppercase() {
      'I' => 1,
      'V' => 5,
      'X' => 10,
      _ => return None,
    };
    if v < prev {
      total -= v;
    } else {
      total += v;
      prev = v;
    }
  }
  u32::try_from(total).ok().filter(|g| *g > 0)
}

// ─── Classification ──────────────────────────────────────────────────────────

enum Classified {
  Person { generation: u32, body: String },
  Spouse { body: String },
  BadGeneration,
  Noise,
}

fn classify_segment(segment: &str) -> Classified {
  if let Some(caps) = SPOUSE_LINE.captures(segment) {
    return Classified::Spouse {
      body: normalize_text(&caps[1]),
    };
  }
  if let Some(caps) = PERSON_LINE.captures(segment) {
    return match repair_generation_token(&caps[1]) {
      Some(generation) => Classified::Person {
        generation,
        body: normalize_text(&caps[2]),
      },
      None => Classified::BadGeneration,
    };
  }
  if let Some(caps) = PERSON_DOT_LINE.captures(segment) {
    let token = &caps[1];
    let generation = if token.chars().all(|c| c.is_ascii_digit()) {
      repair_generation_token(token)
    } else {
      parse_roman(token)
    };
    return match generation {
      Some(generation) => Classified::Person {
        generation,
        body: normalize_text(&caps[2]),
      },
      None => Classified::BadGeneration,
    };
  }
  Classified::Noise
}

/// Scan one page of raw text into classified logical lines.
///
/// Noise segments are appended to the previous logical line's body as
/// continuations (and flagged); a bad generation token flags the line and
/// produces nothing.
pub fn scan_page(page_index: usize, text: &str) -> PageScan {
  let mut scan = PageScan::default();

  for (line_index, physical) in page_lines(text) {
    for (seg_index, segment) in resegment(&physical).into_iter().enumerate() {
      match classify_segment(&segment) {
        Classified::Person { generation, body } => {
          scan.lines.push(LogicalLine {
            page_index,
            line_index,
            raw: segment,
            kind: LineKind::Person { generation },
            body,
          });
        }
        Classified::Spouse { body } => {
          scan.lines.push(LogicalLine {
            page_index,
            line_index,
            raw: segment,
            kind: LineKind::Spouse,
            body,
          });
        }
        Classified::BadGeneration => {
          scan.flagged.push(FlaggedLine {
            page_index,
            line_index,
            raw: segment,
            reason: FlagReason::BadGenerationToken,
          });
        }
        Classified::Noise => {
          // A marker-less prefix produced by re-segmentation is the tail
          // of the previous record, not an anomaly.
          let mid_line_fragment = seg_index == 0 && physical.len() > segment.len();
          match scan.lines.last_mut() {
            Some(prev) => {
              prev.body.push(' ');
              prev.body.push_str(segment.trim());
              if !mid_line_fragment {
                scan.flagged.push(FlaggedLine {
                  page_index,
                  line_index,
                  raw: segment,
                  reason: FlagReason::Unclassified,
                });
              }
            }
            None => {
              scan.flagged.push(FlaggedLine {
                page_index,
                line_index,
                raw: segment,
                reason: FlagReason::Unclassified,
              });
            }
          }
        }
      }
    }
  }
  scan
}
