//! The document-order fold over classified chart lines.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use stemma_core::{ChartStore, FlagReason, FlaggedLine, LineKey, NewPerson};
use stemma_parse::{Entry, LineKind, LogicalLine, decompose, scan_page};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  linker::{self, Parent},
  resolver,
  stack::{Frame, GenerationStack},
};

// ─── Inputs and outputs ──────────────────────────────────────────────────────

/// One page of raw OCR text with its position in the source document.
/// An incremental reparse passes a subset of pages with their original
/// indices; fingerprints then come out identical to a full run.
#[derive(Debug, Clone)]
pub struct Page {
  pub index: usize,
  pub text:  String,
}

impl Page {
  pub fn new(index: usize, text: impl Into<String>) -> Self {
    Self {
      index,
      text: text.into(),
    }
  }
}

/// Totals for one run: distinct records touched, plus every raw line that
/// needs human (or LLM-collaborator) attention.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
  pub people:   usize,
  pub families: usize,
  pub children: usize,
  pub flagged:  Vec<FlaggedLine>,
}

#[derive(Default)]
struct Touched {
  people:   HashSet<Uuid>,
  families: HashSet<Uuid>,
  children: HashSet<Uuid>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// A single-source parse engine over a caller-supplied store.
///
/// The engine performs no I/O of its own and never retries storage
/// failures; transaction scope and pre-parse cleanup are owned by the
/// caller.
pub struct Engine<'s, S: ChartStore> {
  store:     &'s S,
  source_id: Uuid,
}

impl<'s, S: ChartStore> Engine<'s, S> {
  pub fn new(store: &'s S, source_id: Uuid) -> Self {
    Self { store, source_id }
  }

  /// Parse `pages` in document order.
  pub fn run(&self, pages: &[Page]) -> Result<RunStats, S::Error> {
    self.run_with_progress(pages, |_, _| {})
  }

  /// Like [`Engine::run`], invoking `progress(done, total)` after each
  /// logical line. The callback is observability only; it cannot affect
  /// scheduling or ordering.
  pub fn run_with_progress<F>(
    &self,
    pages: &[Page],
    mut progress: F,
  ) -> Result<RunStats, S::Error>
  where
    F: FnMut(usize, usize),
  {
    let mut lines: Vec<LogicalLine> = Vec::new();
    let mut flagged: Vec<FlaggedLine> = Vec::new();
    for page in pages {
      let scan = scan_page(page.index, &page.text);
      lines.extend(scan.lines);
      flagged.extend(scan.flagged);
    }

    let total = lines.len();
    let mut stack = GenerationStack::new();
    let mut touched = Touched::default();

    for (done, line) in lines.iter().enumerate() {
      match line.kind {
        LineKind::Person { generation } => {
          self.on_person(&mut stack, &mut touched, line, generation)?;
        }
        LineKind::Spouse => {
          self.on_spouse(&mut stack, &mut touched, &mut flagged, line)?;
        }
      }
      progress(done + 1, total);
    }

    info!(
      people = touched.people.len(),
      families = touched.families.len(),
      children = touched.children.len(),
      flagged = flagged.len(),
      "chart parse complete"
    );
    Ok(RunStats {
      people:   touched.people.len(),
      families: touched.families.len(),
      children: touched.children.len(),
      flagged,
    })
  }

  // ── Person lines ──────────────────────────────────────────────────────

  fn on_person(
    &self,
    stack: &mut GenerationStack,
    touched: &mut Touched,
    line: &LogicalLine,
    generation: u32,
  ) -> Result<(), S::Error> {
    // A person at depth g ends every open branch at depth g or deeper.
    stack.pop_to(generation);

    let surname_hint = stack.top().and_then(|f| f.surname_hint.clone());
    let entry = decompose(&line.body, surname_hint.as_deref());
    let display = display_name(&entry, line);
    let parent_path = stack.parent_path();

    let person_key = self
      .line_key(&entry, &display, &parent_path, generation, line, "person")
      .digest();
    let person = resolver::resolve_person(
      self.store,
      self.new_person(&entry, &display, generation, person_key, line),
    )?;
    touched.people.insert(person.id);
    debug!(
      page = line.page_index,
      line = line.line_index,
      generation,
      person = %display,
      "person line"
    );

    if let Some(parent) = stack.top_mut()
      && generation == parent.generation + 1
    {
      if parent.family.is_none() {
        let label = format!("{} family", parent.label);
        let family_key = LineKey {
          parent_path: &parent_path,
          generation: Some(parent.generation),
          notes: entry.notes.as_deref(),
          page_index: Some(line.page_index),
          line_index: Some(line.line_index),
          ..LineKey::new(self.source_id, &label, "family")
        }
        .digest();
        let family = linker::ensure_single_parent(
          self.store,
          self.source_id,
          Parent {
            id:  parent.person_id,
            sex: parent.sex,
          },
          &family_key,
          parent.approx || entry.approx,
          Some(line.page_index),
        )?;
        parent.family = Some(family);
      }
      if let Some(family) = parent.family.as_mut() {
        touched.families.insert(family.id);
        let link_key = self
          .line_key(&entry, &display, &parent_path, generation, line, "child-link")
          .digest();
        let link = linker::link_child(
          self.store,
          family,
          person.id,
          &link_key,
          entry.approx,
        )?;
        touched.children.insert(link.id);
      }
    }

    let label = person
      .given
      .clone()
      .or_else(|| person.surname.clone())
      .unwrap_or_else(|| display.clone());
    stack.push(Frame {
      generation,
      person_id: person.id,
      label,
      sex: person.sex,
      approx: person.approx,
      surname_hint: person.surname.clone().or(surname_hint),
      family: None,
    });
    Ok(())
  }

  // ── Spouse lines ──────────────────────────────────────────────────────

  fn on_spouse(
    &self,
    stack: &mut GenerationStack,
    touched: &mut Touched,
    flagged: &mut Vec<FlaggedLine>,
    line: &LogicalLine,
  ) -> Result<(), S::Error> {
    // A spouse attaches to the innermost open person context, and only to
    // it — never to some earlier record found by scanning backwards.
    let Some(top) = stack.top() else {
      warn!(
        page = line.page_index,
        line = line.line_index,
        "spouse line with no open ancestor context"
      );
      flagged.push(FlaggedLine {
        page_index: line.page_index,
        line_index: line.line_index,
        raw:        line.raw.clone(),
        reason:     FlagReason::OrphanSpouse,
      });
      return Ok(());
    };
    let principal = Parent {
      id:  top.person_id,
      sex: top.sex,
    };
    let principal_label = top.label.clone();
    let principal_approx = top.approx;
    let generation = top.generation;
    let parent_path = stack.parent_path();

    let entry = decompose(&line.body, None);
    let display = display_name(&entry, line);

    let mut anchored_path = parent_path.clone();
    anchored_path.push(principal_label.clone());
    let spouse_key = self
      .line_key(&entry, &display, &anchored_path, generation, line, "spouse")
      .digest();
    let spouse = resolver::resolve_person(
      self.store,
      self.new_person(&entry, &display, generation, spouse_key, line),
    )?;
    touched.people.insert(spouse.id);
    debug!(
      page = line.page_index,
      line = line.line_index,
      spouse = %display,
      principal = %principal_label,
      "spouse line"
    );

    let family_label = format!("{principal_label} = {display}");
    let family_key = LineKey {
      parent_path: &parent_path,
      generation: Some(generation),
      birth: entry.birth.as_ref().map(|v| v.raw.as_str()),
      death: entry.death.as_ref().map(|v| v.raw.as_str()),
      title: entry.title.as_deref(),
      notes: entry.notes.as_deref(),
      page_index: Some(line.page_index),
      line_index: Some(line.line_index),
      ..LineKey::new(self.source_id, &family_label, "family")
    }
    .digest();
    let family = linker::upsert_couple(
      self.store,
      self.source_id,
      principal,
      Parent {
        id:  spouse.id,
        sex: spouse.sex,
      },
      &family_key,
      principal_approx || entry.approx,
      Some(line.page_index),
    )?;
    touched.families.insert(family.id);

    if let Some(top) = stack.top_mut() {
      top.family = Some(family);
    }
    Ok(())
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  fn line_key<'a>(
    &self,
    entry: &'a Entry,
    display: &'a str,
    parent_path: &'a [String],
    generation: u32,
    line: &LogicalLine,
    tag: &'a str,
  ) -> LineKey<'a> {
    LineKey {
      parent_path,
      generation: Some(generation),
      birth: entry.birth.as_ref().map(|v| v.raw.as_str()),
      death: entry.death.as_ref().map(|v| v.raw.as_str()),
      title: entry.title.as_deref(),
      notes: entry.notes.as_deref(),
      page_index: Some(line.page_index),
      line_index: Some(line.line_index),
      ..LineKey::new(self.source_id, display, tag)
    }
  }

  fn new_person(
    &self,
    entry: &Entry,
    display: &str,
    generation: u32,
    fingerprint: String,
    line: &LogicalLine,
  ) -> NewPerson {
    NewPerson {
      source_id: self.source_id,
      generation,
      display_name: display.to_string(),
      given: entry.given.clone(),
      surname: entry.surname.clone(),
      surname_inferred: entry.surname_inferred,
      title: entry.title.clone(),
      sex: None,
      birth: entry.birth.clone(),
      death: entry.death.clone(),
      notes: entry.notes.clone(),
      chart_id: entry.chart_id.clone(),
      fingerprint: Some(fingerprint),
      page_index: Some(line.page_index),
      line_index: Some(line.line_index),
      approx: entry.approx,
    }
  }
}

/// The name a record displays under; falls back to the whole body when the
/// decomposer extracted nothing.
fn display_name(entry: &Entry, line: &LogicalLine) -> String {
  if entry.display_name.is_empty() {
    line.body.clone()
  } else {
    entry.display_name.clone()
  }
}
