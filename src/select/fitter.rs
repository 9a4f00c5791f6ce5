//! Base model-fitting primitive shared by every policy.
//!
//! A `ModelFitter` binds one word's (pooled) data to the shared options and
//! attempts seeded fits at a given state count. Failures never escape:
//! `fit` collapses them to `None` ("this candidate is inadmissible for this
//! data"), while `try_fit` keeps the enumerated reason for diagnostics.

use nalgebra::DMatrix;

use crate::corpus::Pooled;
use crate::domain::SelectorOptions;
use crate::hmm::{self, FitError, FitSettings, GaussianHmm};

pub struct ModelFitter<'a> {
    frames: &'a DMatrix<f64>,
    lengths: &'a [usize],
    label: &'a str,
    seed: u64,
    verbose: bool,
}

impl<'a> ModelFitter<'a> {
    /// Fitter over a word's full pooled data.
    pub fn new(pooled: &'a Pooled, label: &'a str, options: &SelectorOptions) -> Self {
        Self::over(&pooled.frames, &pooled.lengths, label, options)
    }

    /// Fitter over an explicit frame subset (fold training data, other
    /// labels' data during the anti-likelihood sweep).
    pub fn over(
        frames: &'a DMatrix<f64>,
        lengths: &'a [usize],
        label: &'a str,
        options: &SelectorOptions,
    ) -> Self {
        Self {
            frames,
            lengths,
            label,
            seed: options.seed,
            verbose: options.verbose,
        }
    }

    /// Attempt a fit, keeping the failure reason.
    pub fn try_fit(&self, n_states: usize) -> Result<GaussianHmm, FitError> {
        let settings = FitSettings::new(n_states, self.seed);
        match hmm::fit(self.frames, self.lengths, &settings) {
            Ok(model) => {
                if self.verbose {
                    eprintln!("model created for {} with {} states", self.label, n_states);
                }
                Ok(model)
            }
            Err(err) => {
                if self.verbose {
                    eprintln!(
                        "fit failed for {} with {} states: {err}",
                        self.label, n_states
                    );
                }
                Err(err)
            }
        }
    }

    /// Attempt a fit; absence means the candidate is unusable.
    pub fn fit(&self, n_states: usize) -> Option<GaussianHmm> {
        self.try_fit(n_states).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Corpus, generate_corpus};
    use crate::domain::SyntheticSpec;

    fn corpus() -> Corpus {
        generate_corpus(&SyntheticSpec::default()).unwrap()
    }

    #[test]
    fn fit_succeeds_on_reasonable_data() {
        let corpus = corpus();
        let label = corpus.labels().next().unwrap().to_string();
        let pooled = corpus.pooled(&label).unwrap();
        let options = SelectorOptions::default();

        let fitter = ModelFitter::new(pooled, &label, &options);
        let model = fitter.fit(3).expect("3-state fit on synthetic data");
        assert_eq!(model.n_states(), 3);
    }

    #[test]
    fn fit_absorbs_failures_into_none() {
        // One 1-frame sequence cannot support any 2+-state model.
        let pooled = Pooled {
            frames: DMatrix::from_row_slice(1, 2, &[0.5, 0.5]),
            lengths: vec![1],
        };
        let options = SelectorOptions::default();
        let fitter = ModelFitter::new(&pooled, "tiny", &options);

        assert!(fitter.fit(2).is_none());
        assert!(matches!(
            fitter.try_fit(2),
            Err(FitError::TooFewFrames { .. })
        ));
    }
}
