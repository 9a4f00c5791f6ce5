//! `word-topo` library crate.
//!
//! The binary (`topo`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., embedding selection in a recognizer)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod corpus;
pub mod debug;
pub mod domain;
pub mod error;
pub mod hmm;
pub mod io;
pub mod report;
pub mod select;
