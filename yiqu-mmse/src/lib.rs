//! Mini-Mental State Examination (MMSE) engine for yiqu.
//!
//! This crate holds the fixed 26-item instrument, the per-kind scoring rules and
//! the operator-paced runner that turns answers into an [`AssessmentReport`].
//!
//! # Architecture
//!
//! ```text
//!  ItemBank::standard(date) ──configure(LocationFacts)──▶ ConfiguredBank
//!                                                            │
//!                                                            ▼
//!            Operator ◀──── prompts / answers ────▶ Assessment (one pass)
//!                                                            │
//!                                                            ▼
//!                                                    AssessmentReport
//! ```
//!
//! The [`Operator`] trait is the only I/O seam: the CLI implements it over the
//! terminal, tests implement it over a script of answers.

mod bank;
mod error;
mod item;
mod operator;
mod report;
mod runner;
pub mod scoring;

pub use bank::{ConfiguredBank, ItemBank, LocationFacts, TemporalFacts};
pub use error::{Error, Result};
pub use item::{Domain, ItemId, LocationSlot, QuestionItem, ScoringKind};
pub use operator::Operator;
pub use report::{AssessmentReport, CognitiveStatus, DomainScore, MAX_TOTAL_SCORE, ResultEntry};
pub use runner::{Assessment, Phase, administer, collect_location_facts};
pub use scoring::{Judgment, TextMatching, Verdict};
