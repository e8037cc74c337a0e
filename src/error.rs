//! Error types for the verity library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`VerityError`] enum.
//!
//! # Examples
//!
//! ```
//! use verity::error::{Result, VerityError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(VerityError::invalid_config("sequence_length must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for verity operations.
#[derive(Error, Debug)]
pub enum VerityError {
    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from an input dataset
    #[error("Dataset {path} is missing required column '{column}'")]
    MissingColumn { path: String, column: String },

    /// Dataset-related errors other than missing columns
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Invalid configuration values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two label sequences that must be aligned have different lengths
    #[error("Length mismatch: {predicted} predicted labels vs {actual} actual labels")]
    LengthMismatch { predicted: usize, actual: usize },

    /// Classifier errors (training, prediction, persistence)
    #[error("Model error: {0}")]
    Model(String),

    /// Regex compilation errors
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad command line input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Ad-hoc failures raised with `anyhow!`
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with VerityError.
pub type Result<T> = std::result::Result<T, VerityError>;

impl VerityError {
    /// Create a new dataset error.
    pub fn dataset<S: Into<String>>(msg: S) -> Self {
        VerityError::Dataset(msg.into())
    }

    /// Create a new missing column error.
    pub fn missing_column<P: Into<String>, C: Into<String>>(path: P, column: C) -> Self {
        VerityError::MissingColumn {
            path: path.into(),
            column: column.into(),
        }
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        VerityError::Analysis(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        VerityError::InvalidConfig(msg.into())
    }

    /// Create a new length mismatch error.
    pub fn length_mismatch(predicted: usize, actual: usize) -> Self {
        VerityError::LengthMismatch { predicted, actual }
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        VerityError::Model(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        VerityError::InvalidArgument(msg.into())
    }
}
