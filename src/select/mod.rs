//! Topology selection: choose the hidden-state count for one word's HMM.
//!
//! Four interchangeable policies share one shape: build a score mapping
//! over the candidate state-count range (skipping candidates that fail to
//! fit or score), then hand the mapping to the aggregator, which picks the
//! extremal entry and re-fits the winner. "No viable candidate" is a
//! legitimate outcome (`None`), never an error.
//!
//! Responsibilities:
//!
//! - the shared base fitting primitive (`fitter`)
//! - extremal pick + winner refit (`aggregate`)
//! - the four policies (`constant`, `bic`, `dic`, `cv`)
//! - the persisted anti-likelihood mapping the DIC policy consumes (`cache`)

pub mod aggregate;
pub mod bic;
pub mod cache;
pub mod constant;
pub mod cv;
pub mod dic;
pub mod fitter;

pub use aggregate::*;
pub use bic::*;
pub use cache::*;
pub use constant::*;
pub use cv::*;
pub use dic::*;
pub use fitter::*;

use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, Pooled};
use crate::domain::{Direction, ScoreTable, SelectorOptions};
use crate::error::AppError;
use crate::hmm::GaussianHmm;

/// One word's view of the corpus plus the shared options.
///
/// The target label's data is resolved once at construction, so accessors
/// are infallible.
#[derive(Debug, Clone)]
pub struct SelectorContext<'a> {
    pub corpus: &'a Corpus,
    pub label: &'a str,
    pub options: &'a SelectorOptions,
    pooled: &'a Pooled,
    sequences: &'a [nalgebra::DMatrix<f64>],
}

impl<'a> SelectorContext<'a> {
    pub fn new(
        corpus: &'a Corpus,
        label: &'a str,
        options: &'a SelectorOptions,
    ) -> Result<Self, AppError> {
        let (Some(pooled), Some(sequences)) = (corpus.pooled(label), corpus.sequences(label))
        else {
            return Err(AppError::config(format!(
                "Label '{label}' is not in the corpus."
            )));
        };
        Ok(Self {
            corpus,
            label,
            options,
            pooled,
            sequences,
        })
    }

    /// The target word's pooled sequences.
    pub fn pooled(&self) -> &'a Pooled {
        self.pooled
    }

    /// The target word's individual sequences.
    pub fn sequences(&self) -> &'a [nalgebra::DMatrix<f64>] {
        self.sequences
    }

    /// Base fitter over the word's full pooled data.
    pub fn fitter(&self) -> ModelFitter<'a> {
        ModelFitter::new(self.pooled, self.label, self.options)
    }
}

/// A candidate that was dropped from the score table, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedCandidate {
    pub n_states: usize,
    pub reason: String,
}

/// A policy's score mapping before aggregation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub direction: Direction,
    pub scores: ScoreTable,
    pub skipped: Vec<SkippedCandidate>,
}

/// A successful selection: the winning state count, the re-fitted model,
/// and the diagnostics that led there.
#[derive(Debug, Clone)]
pub struct Selection {
    pub n_states: usize,
    pub model: GaussianHmm,
    pub scores: ScoreTable,
    pub skipped: Vec<SkippedCandidate>,
}

/// One word's selection result within a corpus-wide run.
///
/// `selection: None` means the word could not be modeled under the policy
/// (every candidate failed); downstream consumers exclude such words
/// rather than treating the run as failed.
#[derive(Debug, Clone)]
pub struct LabelOutcome {
    pub label: String,
    pub selection: Option<Selection>,
}

/// The common policy interface.
pub trait Selector {
    fn context(&self) -> &SelectorContext<'_>;

    /// Build the per-candidate score mapping (ascending candidate order).
    fn evaluate(&self) -> Evaluation;

    /// Evaluate, pick the extremal candidate, re-fit the winner.
    fn select(&self) -> Option<Selection> {
        let eval = self.evaluate();
        let fitter = self.context().fitter();
        let (n_states, model) = aggregate::select_model(&eval.scores, eval.direction, &fitter)?;
        Some(Selection {
            n_states,
            model,
            scores: eval.scores,
            skipped: eval.skipped,
        })
    }
}
