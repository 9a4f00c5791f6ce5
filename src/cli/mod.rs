//! Command-line parsing for the topology selector.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{DEFAULT_MAX_STATES, DEFAULT_MIN_STATES, Policy};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "topo", version, about = "HMM topology selector for isolated-word corpora")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select a state count per word and print the outcome table.
    Select(SelectArgs),
    /// Generate a synthetic corpus JSON.
    Sample(SampleArgs),
    /// Write a markdown debug bundle (score tables for every policy).
    Debug(SelectArgs),
}

/// Common options for selection and the debug bundle.
#[derive(Debug, Parser, Clone)]
pub struct SelectArgs {
    /// Corpus JSON path; omit to run against a synthetic corpus.
    #[arg(short = 'c', long)]
    pub corpus: Option<PathBuf>,

    /// Restrict selection to one word label.
    #[arg(short = 'w', long)]
    pub word: Option<String>,

    /// Selection policy.
    #[arg(short = 'p', long, value_enum, default_value_t = Policy::Bic)]
    pub policy: Policy,

    /// State count used by the constant policy.
    #[arg(long, default_value_t = 3)]
    pub n_constant: usize,

    /// Minimum candidate state count (inclusive).
    #[arg(long, default_value_t = DEFAULT_MIN_STATES)]
    pub min_states: usize,

    /// Maximum candidate state count (inclusive).
    #[arg(long, default_value_t = DEFAULT_MAX_STATES)]
    pub max_states: usize,

    /// Seed for model initialization (and the synthetic corpus).
    #[arg(long, default_value_t = 14)]
    pub seed: u64,

    /// Print per-(word, state count) fit diagnostics to stderr.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Anti-likelihood cache location (discriminative policy only).
    #[arg(long, default_value = "anti_likelihood_cache.json")]
    pub cache: PathBuf,

    /// Export the per-word outcomes as JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,

    #[command(flatten)]
    pub synthetic: SyntheticArgs,
}

/// Options for `topo sample`.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output corpus JSON path.
    #[arg(short = 'o', long)]
    pub out: PathBuf,

    #[command(flatten)]
    pub synthetic: SyntheticArgs,
}

/// Synthetic corpus knobs shared by `select`, `debug`, and `sample`.
#[derive(Debug, Parser, Clone)]
pub struct SyntheticArgs {
    /// Number of word labels to generate.
    #[arg(long, default_value_t = 5)]
    pub labels: usize,

    /// Sequences generated per label.
    #[arg(long, default_value_t = 8)]
    pub sequences: usize,

    /// Minimum sequence length (frames).
    #[arg(long, default_value_t = 20)]
    pub min_len: usize,

    /// Maximum sequence length (frames).
    #[arg(long, default_value_t = 40)]
    pub max_len: usize,

    /// Feature dimensionality of each frame.
    #[arg(long, default_value_t = 2)]
    pub dims: usize,

    /// Hidden states of each label's ground-truth model.
    #[arg(long, default_value_t = 3)]
    pub states: usize,

    /// Seed for corpus generation (independent of the fit seed).
    #[arg(long, default_value_t = 42)]
    pub corpus_seed: u64,
}
