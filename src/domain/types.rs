//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during selection
//! - exported to JSON for downstream tooling
//! - printed in reports and debug bundles

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which topology-selection policy to run for a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Always pick the configured constant state count (baseline/control).
    Constant,
    /// Penalized likelihood: `-2 logL + p ln(N)`, lower is better.
    Bic,
    /// Discriminative: own likelihood minus mean likelihood of other words,
    /// higher is better.
    Dic,
    /// 2-fold cross-validation on the word's own sequences, higher is better.
    Cv,
}

impl Policy {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Policy::Constant => "constant",
            Policy::Bic => "BIC",
            Policy::Dic => "DIC",
            Policy::Cv => "CV",
        }
    }

    pub const ALL: [Policy; 4] = [Policy::Constant, Policy::Bic, Policy::Dic, Policy::Cv];
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // CLI value names (also used by clap for default rendering).
        f.write_str(match self {
            Policy::Constant => "constant",
            Policy::Bic => "bic",
            Policy::Dic => "dic",
            Policy::Cv => "cv",
        })
    }
}

/// Whether a lower or a higher score wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Minimize,
    Maximize,
}

/// Closed, inclusive range of candidate hidden-state counts.
///
/// Invariants enforced at construction: `min >= 2` and `min <= max`.
/// A range that violates them is a configuration error, not a silent
/// empty iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRange {
    min: usize,
    max: usize,
}

/// Default candidate range, `[2, 10]`.
pub const DEFAULT_MIN_STATES: usize = 2;
pub const DEFAULT_MAX_STATES: usize = 10;

impl CandidateRange {
    pub fn new(min: usize, max: usize) -> Result<Self, AppError> {
        if min < 2 {
            return Err(AppError::config(format!(
                "Minimum state count must be >= 2 (got {min})."
            )));
        }
        if min > max {
            return Err(AppError::config(format!(
                "Invalid state-count range: min={min} > max={max}."
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Candidates in ascending order. Policies must iterate this order when
    /// building a `ScoreTable` so tie-breaking stays reproducible.
    pub fn iter(&self) -> impl Iterator<Item = usize> + use<> {
        self.min..=self.max
    }

    pub fn contains(&self, n: usize) -> bool {
        n >= self.min && n <= self.max
    }

    pub fn len(&self) -> usize {
        self.max - self.min + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for CandidateRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_STATES,
            max: DEFAULT_MAX_STATES,
        }
    }
}

/// Mapping from candidate state count to a criterion score.
///
/// Candidates that failed to fit or score are simply absent; an empty table
/// means no candidate was viable. Backed by a `BTreeMap` so iteration is
/// always in ascending state-count order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable(BTreeMap<usize, f64>);

impl ScoreTable {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, n_states: usize, score: f64) {
        self.0.insert(n_states, score);
    }

    pub fn get(&self, n_states: usize) -> Option<f64> {
        self.0.get(&n_states).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Entries in ascending state-count order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.0.iter().map(|(&n, &s)| (n, s))
    }
}

impl FromIterator<(usize, f64)> for ScoreTable {
    fn from_iter<T: IntoIterator<Item = (usize, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Options shared by every selection policy.
#[derive(Debug, Clone)]
pub struct SelectorOptions {
    /// State count used by the constant policy.
    pub n_constant: usize,
    /// Candidate state-count range for the searching policies.
    pub range: CandidateRange,
    /// Seed for model initialization (and synthetic data derivation).
    pub seed: u64,
    /// Print per-(word, state count) fit diagnostics to stderr.
    pub verbose: bool,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            n_constant: 3,
            range: CandidateRange::default(),
            seed: 14,
            verbose: false,
        }
    }
}

/// Parameters for synthetic corpus generation.
#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    /// Number of distinct word labels.
    pub n_labels: usize,
    /// Sequences generated per label.
    pub sequences_per_label: usize,
    /// Sequence length bounds (inclusive).
    pub min_len: usize,
    pub max_len: usize,
    /// Feature dimensionality of each frame.
    pub n_dims: usize,
    /// Hidden states of each label's ground-truth model.
    pub n_states: usize,
    /// Base seed; each label derives its own stream from it.
    pub seed: u64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            n_labels: 5,
            sequences_per_label: 8,
            min_len: 20,
            max_len: 40,
            n_dims: 2,
            n_states: 3,
            seed: 42,
        }
    }
}

/// A full `topo select` run's configuration, derived from CLI flags.
#[derive(Debug, Clone)]
pub struct SelectConfig {
    /// Corpus JSON path; when absent, a synthetic corpus is generated.
    pub corpus_path: Option<PathBuf>,
    /// Synthetic corpus parameters (used when `corpus_path` is absent).
    pub synthetic: SyntheticSpec,
    /// Restrict selection to a single word label.
    pub label: Option<String>,
    pub policy: Policy,
    pub options: SelectorOptions,
    /// Location of the persisted anti-likelihood cache (DIC only).
    pub cache_path: PathBuf,
    /// Optional JSON export of the per-label outcomes.
    pub export: Option<PathBuf>,
}

/// A `topo sample` run's configuration.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub spec: SyntheticSpec,
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_range_rejects_min_below_two() {
        let err = CandidateRange::new(1, 4).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn candidate_range_rejects_inverted_bounds() {
        let err = CandidateRange::new(5, 3).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn candidate_range_iterates_ascending_inclusive() {
        let range = CandidateRange::new(2, 5).unwrap();
        let candidates: Vec<usize> = range.iter().collect();
        assert_eq!(candidates, vec![2, 3, 4, 5]);
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn score_table_iterates_in_key_order() {
        let mut table = ScoreTable::new();
        table.insert(7, 1.0);
        table.insert(2, 3.0);
        table.insert(4, 2.0);
        let keys: Vec<usize> = table.iter().map(|(n, _)| n).collect();
        assert_eq!(keys, vec![2, 4, 7]);
    }
}
