//! Write the selection report JSON.
//!
//! The export is the "portable" record of one selection run: which policy
//! ran, under which seed and candidate range, and what every word got,
//! including the per-candidate score table and the candidates that were
//! skipped, so downstream tooling can audit a choice without re-running it.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::{Policy, ScoreTable};
use crate::error::AppError;
use crate::select::SkippedCandidate;

/// On-disk schema of a selection export.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionExport {
    pub tool: String,
    /// RFC 3339 generation timestamp.
    pub generated: String,
    pub policy: Policy,
    pub seed: u64,
    pub min_states: usize,
    pub max_states: usize,
    pub words: Vec<WordOutcome>,
}

/// One word's outcome. `n_states` absent means the word could not be
/// modeled under this policy.
#[derive(Debug, Clone, Serialize)]
pub struct WordOutcome {
    pub label: String,
    pub n_states: Option<usize>,
    /// Winning criterion score, when the policy produced a score table.
    pub score: Option<f64>,
    pub scores: ScoreTable,
    pub skipped: Vec<SkippedCandidate>,
}

/// Write a selection export JSON file.
pub fn write_selection_json(path: &Path, export: &SelectionExport) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::config(format!("Failed to create export '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, export)
        .map_err(|e| AppError::internal(format!("Failed to write export JSON: {e}")))?;
    Ok(())
}
