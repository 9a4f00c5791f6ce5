//! File formats: corpus input, cache artifact, selection export.
//!
//! Everything here is plain JSON via serde, with errors mapped to
//! `AppError` and messages that name the offending path.

pub mod cache;
pub mod corpus_file;
pub mod export;

pub use cache::*;
pub use corpus_file::*;
pub use export::*;
