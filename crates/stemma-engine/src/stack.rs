//! The generation stack — one frame per open ancestor.
//!
//! Frames carry ids and denormalized scalars, never references into the
//! entity table; the only record a frame owns is a cached copy of the
//! family it is currently filling with children.

use stemma_core::{FamilyRecord, Sex};
use uuid::Uuid;

/// The context open at one generation depth.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
  pub generation:   u32,
  pub person_id:    Uuid,
  /// Display label used for fingerprint parent paths.
  pub label:        String,
  pub sex:          Option<Sex>,
  pub approx:       bool,
  /// Surname propagated top-down to descendants that lack one.
  pub surname_hint: Option<String>,
  /// The family children of this frame attach to; created lazily on the
  /// first child or spouse line.
  pub family:       Option<FamilyRecord>,
}

#[derive(Debug, Default)]
pub(crate) struct GenerationStack {
  frames: Vec<Frame>,
}

impl GenerationStack {
  pub fn new() -> Self {
    Self::default()
  }

  /// Close every branch at depth `generation` or deeper. The new top, if
  /// any, is the parent context for a person line at `generation`.
  pub fn pop_to(&mut self, generation: u32) {
    while self
      .frames
      .last()
      .is_some_and(|frame| frame.generation >= generation)
    {
      self.frames.pop();
    }
  }

  pub fn push(&mut self, frame: Frame) {
    self.frames.push(frame);
  }

  pub fn top(&self) -> Option<&Frame> {
    self.frames.last()
  }

  pub fn top_mut(&mut self) -> Option<&mut Frame> {
    self.frames.last_mut()
  }

  pub fn is_empty(&self) -> bool {
    self.frames.is_empty()
  }

  /// Labels of the open ancestor chain, outermost first.
  pub fn parent_path(&self) -> Vec<String> {
    self.frames.iter().map(|f| f.label.clone()).collect()
  }
}
