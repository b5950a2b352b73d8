//! Line-key fingerprints — the primary dedup key for every upsert.
//!
//! A fingerprint digests the source id, the position of the record in the
//! document, its textual content, and the names of the ancestors it hangs
//! under. Reprocessing identical input therefore reproduces identical keys,
//! which is what makes every engine write idempotent.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::text::normalize_key;

/// Components of one fingerprint. Build with struct-update syntax from
/// [`LineKey::new`] and finish with [`LineKey::digest`].
#[derive(Debug, Clone, Default)]
pub struct LineKey<'a> {
  pub source_id:   Uuid,
  /// Display labels of the open ancestor chain, outermost first.
  pub parent_path: &'a [String],
  pub text:        &'a str,
  pub generation:  Option<u32>,
  pub birth:       Option<&'a str>,
  pub death:       Option<&'a str>,
  pub title:       Option<&'a str>,
  pub notes:       Option<&'a str>,
  pub page_index:  Option<usize>,
  pub line_index:  Option<usize>,
  /// Discriminates record kinds derived from the same line
  /// ("person", "spouse", "family", "child-link").
  pub tag:         &'a str,
}

impl<'a> LineKey<'a> {
  pub fn new(source_id: Uuid, text: &'a str, tag: &'a str) -> Self {
    Self {
      source_id,
      text,
      tag,
      ..Self::default()
    }
  }

  /// SHA-256 over the normalized, `|`-joined components, hex-encoded.
  pub fn digest(&self) -> String {
    let norm = |v: Option<&str>| v.map(normalize_key).unwrap_or_default();
    let parent = self
      .parent_path
      .iter()
      .map(|p| normalize_key(p))
      .collect::<Vec<_>>()
      .join("/");
    let components = [
      self.source_id.hyphenated().to_string(),
      parent,
      normalize_key(self.text),
      self.tag.to_string(),
      self.generation.map(|g| g.to_string()).unwrap_or_default(),
      norm(self.birth),
      norm(self.death),
      norm(self.title),
      norm(self.notes),
      format!(
        "{}:{}",
        self.page_index.map(|p| p.to_string()).unwrap_or_default(),
        self.line_index.map(|l| l.to_string()).unwrap_or_default(),
      ),
    ];
    let digest = Sha256::digest(components.join("|").as_bytes());
    hex::encode(digest)
  }
}
