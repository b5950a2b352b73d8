//! Text layer for the Stemma chart-parsing engine.
//!
//! Pipeline:
//!   raw page text
//!     └─ normalize::page_lines()   → headers stripped, wraps rejoined,
//!        mid-line markers re-segmented
//!          └─ classify::scan_page() → LogicalLine stream + flagged lines
//!               └─ decompose::decompose() → Entry (name, vitals, title,
//!                  chart id, notes)
//!
//! Pure synchronous text processing; no storage dependencies. Dirty input
//! never returns an error from this crate — anything unrecognizable
//! degrades to the flagged-lines list.

mod classify;
mod decompose;
mod normalize;

pub use classify::{LineKind, LogicalLine, PageScan, scan_page};
pub use decompose::{Entry, decompose, has_approx};
