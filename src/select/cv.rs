//! Cross-validation policy.
//!
//! Estimates generalization from the word's own sequences: split them into
//! two deterministic folds, fit each candidate on the training fold, score
//! the held-out fold, and average the successful fold scores. Higher is
//! better. Candidates with no successful fold are skipped.
//!
//! Words with too few sequences to split fall back to a single fit/score
//! pass at `FALLBACK_STATES` on the full data, giving a one-entry table.

use crate::corpus::{KFold, combine};
use crate::domain::{Direction, ScoreTable};
use crate::select::fitter::ModelFitter;
use crate::select::{Evaluation, Selector, SelectorContext, SkippedCandidate};

/// Fixed fold count.
const FOLDS: usize = 2;

/// State count used by the too-few-sequences fallback.
const FALLBACK_STATES: usize = 3;

pub struct CvSelector<'a> {
    ctx: SelectorContext<'a>,
}

impl<'a> CvSelector<'a> {
    pub fn new(ctx: SelectorContext<'a>) -> Self {
        Self { ctx }
    }

    /// Mean held-out log-likelihood over successful folds for one candidate.
    fn fold_mean(
        &self,
        n_states: usize,
        folds: &[(Vec<usize>, Vec<usize>)],
        failures: &mut Vec<String>,
    ) -> Option<f64> {
        let seqs = self.ctx.sequences();
        let mut fold_scores = Vec::with_capacity(folds.len());

        for (fold_idx, (train, test)) in folds.iter().enumerate() {
            let train_pool = combine(seqs, train);
            let test_pool = combine(seqs, test);

            let fitter = ModelFitter::over(
                &train_pool.frames,
                &train_pool.lengths,
                self.ctx.label,
                self.ctx.options,
            );
            match fitter.try_fit(n_states) {
                Ok(model) => match model.score(&test_pool.frames, &test_pool.lengths) {
                    Ok(ll) => fold_scores.push(ll),
                    Err(err) => failures.push(format!("fold {fold_idx} score: {err}")),
                },
                Err(err) => failures.push(format!("fold {fold_idx} fit: {err}")),
            }
        }

        if fold_scores.is_empty() {
            None
        } else {
            Some(fold_scores.iter().sum::<f64>() / fold_scores.len() as f64)
        }
    }

    /// Single fit/score pass on the full data when folds are impossible.
    fn fallback(&self, scores: &mut ScoreTable, skipped: &mut Vec<SkippedCandidate>) {
        let pooled = self.ctx.pooled();
        let fitter = self.ctx.fitter();
        match fitter.try_fit(FALLBACK_STATES) {
            Ok(model) => match model.score(&pooled.frames, &pooled.lengths) {
                Ok(ll) => scores.insert(FALLBACK_STATES, ll),
                Err(err) => skipped.push(SkippedCandidate {
                    n_states: FALLBACK_STATES,
                    reason: format!("fallback score: {err}"),
                }),
            },
            Err(err) => skipped.push(SkippedCandidate {
                n_states: FALLBACK_STATES,
                reason: format!("fallback fit: {err}"),
            }),
        }
    }
}

impl Selector for CvSelector<'_> {
    fn context(&self) -> &SelectorContext<'_> {
        &self.ctx
    }

    fn evaluate(&self) -> Evaluation {
        let mut scores = ScoreTable::new();
        let mut skipped = Vec::new();

        match KFold::new(FOLDS).split(self.ctx.sequences().len()) {
            Ok(folds) => {
                for n in self.ctx.options.range.iter() {
                    let mut failures = Vec::new();
                    match self.fold_mean(n, &folds, &mut failures) {
                        Some(mean) => scores.insert(n, mean),
                        None => skipped.push(SkippedCandidate {
                            n_states: n,
                            reason: failures.join("; "),
                        }),
                    }
                }
            }
            Err(_) => self.fallback(&mut scores, &mut skipped),
        }

        Evaluation {
            direction: Direction::Maximize,
            scores,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Corpus, generate_corpus};
    use crate::domain::{CandidateRange, SelectorOptions, SyntheticSpec};
    use nalgebra::DMatrix;
    use std::collections::BTreeMap;

    #[test]
    fn folds_produce_scores_for_viable_candidates() {
        let spec = SyntheticSpec {
            n_labels: 1,
            sequences_per_label: 8,
            min_len: 25,
            max_len: 40,
            ..SyntheticSpec::default()
        };
        let corpus = generate_corpus(&spec).unwrap();
        let label = corpus.labels().next().unwrap().to_string();
        let options = SelectorOptions {
            range: CandidateRange::new(2, 4).unwrap(),
            ..SelectorOptions::default()
        };

        let ctx = SelectorContext::new(&corpus, &label, &options).unwrap();
        let selection = CvSelector::new(ctx).select().unwrap();
        assert!(options.range.contains(selection.n_states));
        assert!(!selection.scores.is_empty());
    }

    #[test]
    fn single_sequence_triggers_the_fallback() {
        // One long well-behaved sequence: unsplittable, so the table must
        // contain exactly the fallback entry.
        let values: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 0.0 } else { 4.0 }).collect();
        let mut map = BTreeMap::new();
        map.insert(
            "solo".to_string(),
            vec![DMatrix::from_column_slice(60, 1, &values)],
        );
        let corpus = Corpus::from_sequences(map).unwrap();
        let options = SelectorOptions::default();

        let ctx = SelectorContext::new(&corpus, "solo", &options).unwrap();
        let eval = CvSelector::new(ctx).evaluate();

        assert_eq!(eval.scores.len(), 1);
        assert!(eval.scores.get(FALLBACK_STATES).is_some());
    }

    #[test]
    fn unsplittable_degenerate_data_yields_no_selection() {
        // A single 1-frame sequence: the fallback fit fails too.
        let mut map = BTreeMap::new();
        map.insert(
            "dot".to_string(),
            vec![DMatrix::from_row_slice(1, 1, &[0.0])],
        );
        let corpus = Corpus::from_sequences(map).unwrap();
        let options = SelectorOptions::default();

        let ctx = SelectorContext::new(&corpus, "dot", &options).unwrap();
        let selector = CvSelector::new(ctx);
        assert!(selector.evaluate().scores.is_empty());
        assert!(selector.select().is_none());
    }

    #[test]
    fn repeated_runs_pick_the_same_winner() {
        let corpus = generate_corpus(&SyntheticSpec::default()).unwrap();
        let label = corpus.labels().next().unwrap().to_string();
        let options = SelectorOptions {
            range: CandidateRange::new(2, 3).unwrap(),
            ..SelectorOptions::default()
        };

        let ctx = SelectorContext::new(&corpus, &label, &options).unwrap();
        let a = CvSelector::new(ctx.clone()).select().map(|s| s.n_states);
        let b = CvSelector::new(ctx).select().map(|s| s.n_states);
        assert_eq!(a, b);
    }
}
