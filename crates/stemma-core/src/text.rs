//! The single normalization pass applied to every piece of chart text.
//!
//! OCR output is full of typographic dashes, curly quotes and soft hyphens.
//! All of them are folded to their ASCII forms here, once, at ingestion;
//! every downstream pattern and key operates only on normalized text.

/// Dash-like characters that OCR produces for the chart's record dashes.
/// U+2010..U+2015 (hyphen through horizontal bar) plus U+2212 (minus sign).
pub const DASHES: [char; 7] = [
  '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}',
  '\u{2212}',
];

/// Fold dashes and quotes to ASCII, drop soft hyphens, collapse runs of
/// spaces and tabs, and trim.
pub fn normalize_text(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  let mut pending_space = false;
  for c in value.chars() {
    let c = match c {
      '\u{00AD}' => continue, // soft hyphen
      c if DASHES.contains(&c) => '-',
      '\u{2018}' | '\u{2019}' | '\u{201A}' => '\'',
      '\u{201C}' | '\u{201D}' | '\u{201E}' => '"',
      ' ' | '\t' => {
        pending_space = true;
        continue;
      }
      c => c,
    };
    if pending_space {
      if !out.is_empty() {
        out.push(' ');
      }
      pending_space = false;
    }
    out.push(c);
  }
  out
}

/// Lowercased normalized form used for fingerprint components and
/// name-match keys.
pub fn normalize_key(value: &str) -> String {
  normalize_text(value).to_lowercase()
}

/// `Some(trimmed)` when non-empty, `None` otherwise.
pub fn opt_str(s: &str) -> Option<String> {
  let s = s.trim();
  if s.is_empty() { None } else { Some(s.to_string()) }
}
