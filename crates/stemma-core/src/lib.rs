//! Core types and trait definitions for the Stemma chart-parsing engine.
//!
//! This crate is deliberately free of database and pattern-matching
//! dependencies. All other crates depend on it; it depends on nothing
//! proprietary.

pub mod family;
pub mod fingerprint;
pub mod flag;
pub mod person;
pub mod store;
pub mod text;

pub use family::{ChildLink, FamilyRecord, NewChildLink, NewFamily, canonical_pair};
pub use fingerprint::LineKey;
pub use flag::{FlagReason, FlaggedLine};
pub use person::{NewPerson, PersonRecord, Sex, Vitals};
pub use store::ChartStore;
