//! Word corpus handling.
//!
//! Responsibilities:
//!
//! - normalized in-memory corpus: label → sequences, plus the derived
//!   pooled (stacked frames, lengths) form used for fitting (`corpus`)
//! - deterministic contiguous k-fold index splitting (`folds`)
//! - seeded synthetic corpus generation for demos and tests (`sample`)

pub mod corpus;
pub mod folds;
pub mod sample;

pub use corpus::*;
pub use folds::*;
pub use sample::*;
