//! Penalized-likelihood policy (Bayesian Information Criterion).
//!
//! For each candidate `n`: fit on the word's own data, then score
//!
//! `bic = -2 logL + p ln(N)`
//!
//! where `N` is the word's total frame count and `p` is the free-parameter
//! count of an n-state diagonal-covariance model over d-dimensional frames:
//!
//! `p = n² + 2·d·n − 1`
//!
//! (transition probabilities plus per-state mean/variance parameters, minus
//! normalization constraints). Lower is better.

use crate::domain::{Direction, ScoreTable};
use crate::select::{Evaluation, Selector, SelectorContext, SkippedCandidate};

pub struct BicSelector<'a> {
    ctx: SelectorContext<'a>,
}

impl<'a> BicSelector<'a> {
    pub fn new(ctx: SelectorContext<'a>) -> Self {
        Self { ctx }
    }
}

/// Free-parameter count for an n-state model over d-dimensional frames.
fn free_parameters(n_states: usize, n_dims: usize) -> f64 {
    (n_states * n_states + 2 * n_dims * n_states - 1) as f64
}

impl Selector for BicSelector<'_> {
    fn context(&self) -> &SelectorContext<'_> {
        &self.ctx
    }

    fn evaluate(&self) -> Evaluation {
        let pooled = self.ctx.pooled();
        let n_frames = pooled.frames.nrows() as f64;
        let n_dims = pooled.frames.ncols();
        let fitter = self.ctx.fitter();

        let mut scores = ScoreTable::new();
        let mut skipped = Vec::new();

        for n in self.ctx.options.range.iter() {
            let model = match fitter.try_fit(n) {
                Ok(model) => model,
                Err(err) => {
                    skipped.push(SkippedCandidate {
                        n_states: n,
                        reason: format!("fit: {err}"),
                    });
                    continue;
                }
            };
            match model.score(&pooled.frames, &pooled.lengths) {
                Ok(log_likelihood) => {
                    let penalty = free_parameters(n, n_dims) * n_frames.ln();
                    scores.insert(n, -2.0 * log_likelihood + penalty);
                }
                Err(err) => skipped.push(SkippedCandidate {
                    n_states: n,
                    reason: format!("score: {err}"),
                }),
            }
        }

        Evaluation {
            direction: Direction::Minimize,
            scores,
            skipped,
        }
    }
}
