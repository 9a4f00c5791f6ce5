//! Anti-likelihood cache consumed by the discriminative policy.
//!
//! For every (state count, label) pair the cache stores the log-likelihood
//! of that label's data under an n-state model fitted to the label's own
//! data. Building it is a full corpus sweep, O(labels × candidates) fits,
//! so the result is persisted and reused across selection calls.
//!
//! Entry policy: a pair whose fit or score fails stores the sentinel `0.0`
//! rather than being omitted; the discriminative average keeps its fixed
//! `M − 1` denominator either way.
//!
//! Staleness: the persisted artifact carries a fingerprint of the corpus
//! shape and the selection options; a mismatch on load triggers a rebuild
//! instead of silently serving values for a different corpus.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::corpus::Corpus;
use crate::domain::SelectorOptions;
use crate::error::AppError;
use crate::io::cache::{CacheFile, read_cache_file, write_cache_file};
use crate::select::fitter::ModelFitter;

#[derive(Debug, Clone)]
pub struct AntiLikelihoodCache {
    entries: BTreeMap<String, f64>,
}

impl AntiLikelihoodCache {
    /// Serialized key for one (state count, label) pair.
    pub fn key(n_states: usize, label: &str) -> String {
        format!("{n_states}_{label}")
    }

    pub fn from_entries(entries: BTreeMap<String, f64>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &BTreeMap<String, f64> {
        &self.entries
    }

    /// Cached score for one pair; absent entries are the caller's problem
    /// (the discriminative policy substitutes the 0.0 sentinel).
    pub fn get(&self, n_states: usize, label: &str) -> Option<f64> {
        self.entries.get(&Self::key(n_states, label)).copied()
    }

    /// Full corpus sweep: one fit + self-score per (candidate, label).
    pub fn build(corpus: &Corpus, options: &SelectorOptions) -> Self {
        let mut entries = BTreeMap::new();
        for n in options.range.iter() {
            for (label, pooled) in corpus.iter_pooled() {
                let fitter = ModelFitter::over(&pooled.frames, &pooled.lengths, label, options);
                let score = fitter
                    .try_fit(n)
                    .ok()
                    .and_then(|model| model.score(&pooled.frames, &pooled.lengths).ok())
                    .unwrap_or(0.0);
                entries.insert(Self::key(n, label), score);
            }
        }
        Self { entries }
    }

    /// Fingerprint of everything the cached scores depend on: corpus shape
    /// (labels, per-label sequence lengths, dimensionality), candidate
    /// range, and seed.
    pub fn fingerprint(corpus: &Corpus, options: &SelectorOptions) -> String {
        let mut hasher = DefaultHasher::new();
        corpus.dim().hash(&mut hasher);
        for (label, pooled) in corpus.iter_pooled() {
            label.hash(&mut hasher);
            pooled.lengths.hash(&mut hasher);
        }
        options.range.min().hash(&mut hasher);
        options.range.max().hash(&mut hasher);
        options.seed.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    /// Load the persisted cache if it matches the current corpus/options,
    /// otherwise rebuild and persist.
    ///
    /// An unreadable or stale file is treated as absent; it is a cache,
    /// not a source of truth.
    pub fn load_or_build(
        path: &Path,
        corpus: &Corpus,
        options: &SelectorOptions,
    ) -> Result<Self, AppError> {
        let fingerprint = Self::fingerprint(corpus, options);

        if path.exists() {
            match read_cache_file(path) {
                Ok(file) if file.fingerprint == fingerprint => {
                    return Ok(Self::from_entries(file.entries));
                }
                Ok(_) => {
                    if options.verbose {
                        eprintln!(
                            "anti-likelihood cache at '{}' is stale; rebuilding",
                            path.display()
                        );
                    }
                }
                Err(err) => {
                    if options.verbose {
                        eprintln!(
                            "anti-likelihood cache at '{}' is unreadable ({err}); rebuilding",
                            path.display()
                        );
                    }
                }
            }
        }

        let cache = Self::build(corpus, options);
        write_cache_file(
            path,
            &CacheFile {
                tool: "topo".to_string(),
                fingerprint,
                entries: cache.entries.clone(),
            },
        )?;
        Ok(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::generate_corpus;
    use crate::domain::{CandidateRange, SyntheticSpec};

    fn small_options() -> SelectorOptions {
        SelectorOptions {
            range: CandidateRange::new(2, 3).unwrap(),
            ..SelectorOptions::default()
        }
    }

    #[test]
    fn build_covers_every_pair() {
        let spec = SyntheticSpec {
            n_labels: 3,
            sequences_per_label: 4,
            ..SyntheticSpec::default()
        };
        let corpus = generate_corpus(&spec).unwrap();
        let options = small_options();

        let cache = AntiLikelihoodCache::build(&corpus, &options);
        assert_eq!(cache.entries().len(), 2 * 3);
        for n in [2usize, 3] {
            for label in corpus.labels() {
                assert!(cache.get(n, label).is_some(), "missing ({n}, {label})");
            }
        }
    }

    #[test]
    fn fingerprint_tracks_corpus_shape() {
        let spec = SyntheticSpec::default();
        let corpus_a = generate_corpus(&spec).unwrap();
        let corpus_b = generate_corpus(&SyntheticSpec {
            sequences_per_label: spec.sequences_per_label + 1,
            ..spec
        })
        .unwrap();
        let options = small_options();

        let fp_a = AntiLikelihoodCache::fingerprint(&corpus_a, &options);
        let fp_b = AntiLikelihoodCache::fingerprint(&corpus_b, &options);
        assert_ne!(fp_a, fp_b);
        assert_eq!(
            fp_a,
            AntiLikelihoodCache::fingerprint(&corpus_a, &options),
            "fingerprint must be stable"
        );
    }

    #[test]
    fn key_layout_is_statecount_underscore_label() {
        assert_eq!(AntiLikelihoodCache::key(4, "hello"), "4_hello");
    }
}
