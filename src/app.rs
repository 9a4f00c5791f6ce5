//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads or generates the corpus
//! - runs topology selection
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, SampleArgs, SelectArgs, SyntheticArgs};
use crate::domain::{CandidateRange, SampleConfig, SelectConfig, SelectorOptions, SyntheticSpec};
use crate::error::AppError;
use crate::io::export::{SelectionExport, WordOutcome, write_selection_json};
use crate::select::LabelOutcome;

pub mod pipeline;

/// Entry point for the `topo` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Select(args) => handle_select(args),
        Command::Sample(args) => handle_sample(args),
        Command::Debug(args) => handle_debug(args),
    }
}

fn handle_select(args: SelectArgs) -> Result<(), AppError> {
    let config = select_config_from_args(&args)?;
    let run = pipeline::run_select(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.outcomes, config.policy, &config.options)
    );

    if let Some(path) = &config.export {
        let export = build_export(&config, &run.outcomes);
        write_selection_json(path, &export)?;
        println!("wrote export to {}", path.display());
    }

    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        spec: synthetic_spec_from_args(&args.synthetic),
        out: args.out,
    };
    let corpus = crate::corpus::generate_corpus(&config.spec)?;
    crate::io::corpus_file::write_corpus_json(&config.out, &corpus)?;

    println!(
        "wrote {} label(s) x {} sequence(s) to {}",
        corpus.n_labels(),
        config.spec.sequences_per_label,
        config.out.display()
    );
    Ok(())
}

fn handle_debug(args: SelectArgs) -> Result<(), AppError> {
    let config = select_config_from_args(&args)?;
    let corpus = pipeline::load_corpus(&config)?;
    let path = crate::debug::write_debug_bundle(&corpus, &config)?;
    println!("wrote debug bundle to {}", path.display());
    Ok(())
}

pub fn select_config_from_args(args: &SelectArgs) -> Result<SelectConfig, AppError> {
    let range = CandidateRange::new(args.min_states, args.max_states)?;
    Ok(SelectConfig {
        corpus_path: args.corpus.clone(),
        synthetic: synthetic_spec_from_args(&args.synthetic),
        label: args.word.clone(),
        policy: args.policy,
        options: SelectorOptions {
            n_constant: args.n_constant,
            range,
            seed: args.seed,
            verbose: args.verbose,
        },
        cache_path: args.cache.clone(),
        export: args.export.clone(),
    })
}

fn synthetic_spec_from_args(args: &SyntheticArgs) -> SyntheticSpec {
    SyntheticSpec {
        n_labels: args.labels,
        sequences_per_label: args.sequences,
        min_len: args.min_len,
        max_len: args.max_len,
        n_dims: args.dims,
        n_states: args.states,
        seed: args.corpus_seed,
    }
}

fn build_export(config: &SelectConfig, outcomes: &[LabelOutcome]) -> SelectionExport {
    let words = outcomes
        .iter()
        .map(|outcome| match &outcome.selection {
            Some(sel) => WordOutcome {
                label: outcome.label.clone(),
                n_states: Some(sel.n_states),
                score: sel.scores.get(sel.n_states),
                scores: sel.scores.clone(),
                skipped: sel.skipped.clone(),
            },
            None => WordOutcome {
                label: outcome.label.clone(),
                n_states: None,
                score: None,
                scores: Default::default(),
                skipped: Vec::new(),
            },
        })
        .collect();

    SelectionExport {
        tool: "topo".to_string(),
        generated: chrono::Local::now().to_rfc3339(),
        policy: config.policy,
        seed: config.options.seed,
        min_states: config.options.range.min(),
        max_states: config.options.range.max(),
        words,
    }
}
