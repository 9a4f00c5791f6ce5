//! Shared "selection pipeline" logic used by the CLI subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! corpus load/generate -> cache (discriminative policy only) ->
//! per-word selection -> outcomes
//!
//! The CLI front-end then focuses on presentation (printing vs exports).

use crate::corpus::{Corpus, generate_corpus};
use crate::domain::{Policy, SelectConfig};
use crate::error::AppError;
use crate::io::corpus_file::read_corpus_json;
use crate::select::{
    AntiLikelihoodCache, BicSelector, ConstantSelector, CvSelector, DicSelector, LabelOutcome,
    Selector, SelectorContext,
};

/// All computed outputs of a single `topo select` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub outcomes: Vec<LabelOutcome>,
}

/// Load the corpus named by the config, or generate the synthetic one.
pub fn load_corpus(config: &SelectConfig) -> Result<Corpus, AppError> {
    match &config.corpus_path {
        Some(path) => read_corpus_json(path),
        None => generate_corpus(&config.synthetic),
    }
}

/// Execute the full selection pipeline.
pub fn run_select(config: &SelectConfig) -> Result<RunOutput, AppError> {
    let corpus = load_corpus(config)?;
    run_select_with_corpus(config, &corpus)
}

/// Execute the selection pipeline against a pre-loaded corpus.
///
/// Useful for the debug bundle, which reuses one corpus across policies.
pub fn run_select_with_corpus(
    config: &SelectConfig,
    corpus: &Corpus,
) -> Result<RunOutput, AppError> {
    let labels: Vec<String> = match &config.label {
        Some(label) => {
            if !corpus.contains(label) {
                return Err(AppError::config(format!(
                    "Label '{label}' is not in the corpus."
                )));
            }
            vec![label.clone()]
        }
        None => corpus.labels().map(str::to_string).collect(),
    };

    // The discriminative policy is the only one with cross-word state; its
    // cache is loaded or built once and shared across every word's call.
    let cache = if config.policy == Policy::Dic {
        Some(AntiLikelihoodCache::load_or_build(
            &config.cache_path,
            corpus,
            &config.options,
        )?)
    } else {
        None
    };

    let mut outcomes = Vec::with_capacity(labels.len());
    for label in labels {
        let ctx = SelectorContext::new(corpus, &label, &config.options)?;
        let selection = match config.policy {
            Policy::Constant => ConstantSelector::new(ctx).select(),
            Policy::Bic => BicSelector::new(ctx).select(),
            Policy::Dic => {
                let cache = cache
                    .as_ref()
                    .ok_or_else(|| AppError::internal("Anti-likelihood cache was not built."))?;
                DicSelector::new(ctx, cache).select()
            }
            Policy::Cv => CvSelector::new(ctx).select(),
        };
        outcomes.push(LabelOutcome { label, selection });
    }

    Ok(RunOutput { outcomes })
}
