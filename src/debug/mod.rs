//! Debug bundle writer for inspecting per-word score tables.
//!
//! Runs every policy over every word of the corpus and dumps the candidate
//! score tables, skip reasons, and chosen state counts as one markdown
//! file. This is the heavyweight inspection path; the normal report only
//! shows winners.

use std::fmt::Write as _;
use std::fs::create_dir_all;
use std::path::PathBuf;

use chrono::Local;

use crate::corpus::Corpus;
use crate::domain::{Policy, SelectConfig};
use crate::error::AppError;
use crate::select::{
    AntiLikelihoodCache, BicSelector, ConstantSelector, CvSelector, DicSelector, Evaluation,
    Selector, SelectorContext,
};

pub fn write_debug_bundle(corpus: &Corpus, config: &SelectConfig) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir)
        .map_err(|e| AppError::internal(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("topo_debug_seed{}_{ts}.md", config.options.seed));

    let cache = AntiLikelihoodCache::load_or_build(&config.cache_path, corpus, &config.options)?;

    let mut out = String::new();
    let _ = writeln!(out, "# topo debug bundle");
    let _ = writeln!(out, "- generated: {}", Local::now().to_rfc3339());
    let _ = writeln!(out, "- labels: {}", corpus.n_labels());
    let _ = writeln!(out, "- feature dims: {}", corpus.dim());
    let _ = writeln!(
        out,
        "- candidates: [{}, {}]",
        config.options.range.min(),
        config.options.range.max()
    );
    let _ = writeln!(out, "- seed: {}", config.options.seed);

    for label in corpus.labels() {
        let ctx = SelectorContext::new(corpus, label, &config.options)?;
        let frames = corpus.frame_count(label).unwrap_or(0);
        let _ = writeln!(out, "\n## Word: {label}");
        let _ = writeln!(
            out,
            "{} sequence(s), {frames} frame(s)",
            ctx.sequences().len()
        );

        for policy in Policy::ALL {
            let (eval, chosen) = match policy {
                Policy::Constant => {
                    let s = ConstantSelector::new(ctx.clone());
                    (s.evaluate(), s.select())
                }
                Policy::Bic => {
                    let s = BicSelector::new(ctx.clone());
                    (s.evaluate(), s.select())
                }
                Policy::Dic => {
                    let s = DicSelector::new(ctx.clone(), &cache);
                    (s.evaluate(), s.select())
                }
                Policy::Cv => {
                    let s = CvSelector::new(ctx.clone());
                    (s.evaluate(), s.select())
                }
            };
            write_policy_section(&mut out, policy, &eval, chosen.map(|s| s.n_states));
        }
    }

    std::fs::write(&path, out)
        .map_err(|e| AppError::internal(format!("Failed to write debug bundle: {e}")))?;
    Ok(path)
}

fn write_policy_section(
    out: &mut String,
    policy: Policy,
    eval: &Evaluation,
    chosen: Option<usize>,
) {
    let _ = writeln!(out, "\n### {}", policy.display_name());
    match chosen {
        Some(n) => {
            let _ = writeln!(out, "chosen: {n} states");
        }
        None => {
            let _ = writeln!(out, "chosen: none (no viable candidate)");
        }
    }

    if !eval.scores.is_empty() {
        let _ = writeln!(out, "| states | score |");
        let _ = writeln!(out, "| - | - |");
        for (n, score) in eval.scores.iter() {
            let _ = writeln!(out, "| {n} | {score:.6} |");
        }
    }
    for skip in &eval.skipped {
        let _ = writeln!(out, "- skipped {}: {}", skip.n_states, skip.reason);
    }
}
