//! Discriminative policy (Discriminative Information Criterion).
//!
//! A good topology for a word should fit that word well *and* fit every
//! other word poorly. For each candidate `n`:
//!
//! `dic = logL(own data) − mean over other labels of anti-likelihood(n, label)`
//!
//! Higher is better. The anti-likelihood terms come from the injected
//! cache; an absent or failed entry contributes the 0.0 sentinel and the
//! denominator stays fixed at `M − 1` (M = corpus label count). With a
//! single-label corpus the discriminative term is zero and the score
//! reduces to the plain likelihood.

use crate::domain::{Direction, ScoreTable};
use crate::select::cache::AntiLikelihoodCache;
use crate::select::{Evaluation, Selector, SelectorContext, SkippedCandidate};

pub struct DicSelector<'a> {
    ctx: SelectorContext<'a>,
    cache: &'a AntiLikelihoodCache,
}

impl<'a> DicSelector<'a> {
    pub fn new(ctx: SelectorContext<'a>, cache: &'a AntiLikelihoodCache) -> Self {
        Self { ctx, cache }
    }

    /// Mean anti-likelihood over the other labels for one candidate.
    fn mean_other(&self, n_states: usize) -> f64 {
        let n_labels = self.ctx.corpus.n_labels();
        if n_labels < 2 {
            return 0.0;
        }
        let sum: f64 = self
            .ctx
            .corpus
            .labels()
            .filter(|label| *label != self.ctx.label)
            .map(|label| self.cache.get(n_states, label).unwrap_or(0.0))
            .sum();
        sum / (n_labels - 1) as f64
    }
}

impl Selector for DicSelector<'_> {
    fn context(&self) -> &SelectorContext<'_> {
        &self.ctx
    }

    fn evaluate(&self) -> Evaluation {
        let pooled = self.ctx.pooled();
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
                Ok(own) => {
                    scores.insert(n, own - self.mean_other(n));
                }
                Err(err) => skipped.push(SkippedCandidate {
                    n_states: n,
                    reason: format!("score: {err}"),
                }),
            }
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
    use crate::corpus::generate_corpus;
    use crate::domain::{CandidateRange, SelectorOptions, SyntheticSpec};

    fn setup() -> (crate::corpus::Corpus, SelectorOptions) {
        let spec = SyntheticSpec {
            n_labels: 3,
            sequences_per_label: 5,
            ..SyntheticSpec::default()
        };
        let corpus = generate_corpus(&spec).unwrap();
        let options = SelectorOptions {
            range: CandidateRange::new(2, 3).unwrap(),
            ..SelectorOptions::default()
        };
        (corpus, options)
    }

    #[test]
    fn scores_combine_own_and_other_likelihoods() {
        let (corpus, options) = setup();
        let cache = AntiLikelihoodCache::build(&corpus, &options);
        let label = corpus.labels().next().unwrap().to_string();

        let ctx = SelectorContext::new(&corpus, &label, &options).unwrap();
        let eval = DicSelector::new(ctx, &cache).evaluate();

        assert!(!eval.scores.is_empty());
        for (_, score) in eval.scores.iter() {
            assert!(score.is_finite());
        }
    }

    #[test]
    fn missing_cache_entries_fall_back_to_zero() {
        let (corpus, options) = setup();
        // Empty cache: every other-label term is the sentinel.
        let cache = AntiLikelihoodCache::from_entries(Default::default());
        let label = corpus.labels().next().unwrap().to_string();

        let ctx = SelectorContext::new(&corpus, &label, &options).unwrap();
        let selector = DicSelector::new(ctx, &cache);
        assert_eq!(selector.mean_other(2), 0.0);

        // Scores then reduce to the own-data likelihood, still usable.
        let eval = selector.evaluate();
        assert!(!eval.scores.is_empty());
    }

    #[test]
    fn degenerate_data_yields_no_selection() {
        use nalgebra::DMatrix;
        use std::collections::BTreeMap;

        let mut map = BTreeMap::new();
        map.insert(
            "dot".to_string(),
            vec![DMatrix::from_row_slice(1, 2, &[0.0, 0.0])],
        );
        let corpus = crate::corpus::Corpus::from_sequences(map).unwrap();
        let options = SelectorOptions::default();
        let cache = AntiLikelihoodCache::build(&corpus, &options);

        let ctx = SelectorContext::new(&corpus, "dot", &options).unwrap();
        assert!(DicSelector::new(ctx, &cache).select().is_none());
    }

    #[test]
    fn selection_returns_a_candidate_from_the_range() {
        let (corpus, options) = setup();
        let cache = AntiLikelihoodCache::build(&corpus, &options);
        let label = corpus.labels().next().unwrap().to_string();

        let ctx = SelectorContext::new(&corpus, &label, &options).unwrap();
        let selection = DicSelector::new(ctx, &cache).select().unwrap();
        assert!(options.range.contains(selection.n_states));
    }
}
