//! Flagged lines — the hand-off point for everything the engine could not
//! confidently interpret. Dirty input never aborts a run; it degrades to an
//! entry here for a human reviewer (or an LLM-correction collaborator) to
//! look at.

use serde::{Deserialize, Serialize};

/// Why a raw line ended up on the flagged list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagReason {
  /// Matched no marker pattern; carried as continuation of the prior record
  /// (or discarded when there was none).
  Unclassified,
  /// Person-marker line whose generation token would not normalize to a
  /// plausible integer. Skipped; the generation stack is untouched.
  BadGenerationToken,
  /// Spouse marker with no open ancestor context to attach to.
  OrphanSpouse,
}

/// One raw line that failed classification or decomposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedLine {
  pub page_index: usize,
  pub line_index: usize,
  pub raw:        String,
  pub reason:     FlagReason,
}
