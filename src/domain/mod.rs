//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - selection policy and score-direction enums (`Policy`, `Direction`)
//! - the candidate state-count range (`CandidateRange`)
//! - the per-candidate score mapping (`ScoreTable`)
//! - configuration structs derived from CLI flags

pub mod types;

pub use types::*;
