//! Command line argument parsing for the verity CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verity - train and evaluate a fake news classifier
#[derive(Parser, Debug, Clone)]
#[command(name = "verity")]
#[command(about = "Train and evaluate a fake/real news text classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct VerityArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl VerityArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show descriptive statistics of a dataset
    Explore(ExploreArgs),

    /// Print the cleaned text of each article
    Clean(CleanArgs),

    /// Train and evaluate a classifier
    Train(TrainArgs),

    /// Classify free text with a saved model
    Predict(PredictArgs),
}

/// The two CSV files every dataset command reads.
#[derive(Parser, Debug, Clone)]
pub struct DatasetArgs {
    /// CSV file with real articles
    #[arg(value_name = "REAL_CSV")]
    pub real: PathBuf,

    /// CSV file with fake articles
    #[arg(value_name = "FAKE_CSV")]
    pub fake: PathBuf,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,
}

/// Arguments for exploring a dataset
#[derive(Parser, Debug, Clone)]
pub struct ExploreArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Number of entries in each top-k list
    #[arg(short, long, default_value = "10")]
    pub top: usize,

    /// Pipeline configuration file (JSON); only the normalizer section is used
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for cleaning a dataset
#[derive(Parser, Debug, Clone)]
pub struct CleanArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Print at most this many articles
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Pipeline configuration file (JSON); only the normalizer section is used
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Pipeline configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Write the trained model bundle here
    #[arg(short = 'o', long, value_name = "MODEL_FILE")]
    pub model_out: Option<PathBuf>,

    /// Seed for the split and the classifier
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Number of training epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Vocabulary capacity, including the reserved id
    #[arg(long)]
    pub max_vocab: Option<usize>,

    /// Encoded sequence length
    #[arg(long)]
    pub sequence_length: Option<usize>,

    /// Number of worker threads
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}

/// Arguments for prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Model bundle written by `train --model-out`
    #[arg(value_name = "MODEL_FILE")]
    pub model: PathBuf,

    /// Texts to classify
    #[arg(value_name = "TEXT", required = true)]
    pub texts: Vec<String>,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

impl DatasetArgs {
    /// The delimiter as a byte, if it is ASCII.
    pub fn delimiter_byte(&self) -> Option<u8> {
        u8::try_from(self.delimiter).ok().filter(u8::is_ascii)
    }
}
