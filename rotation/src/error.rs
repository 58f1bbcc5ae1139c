//! Rotation-specific error types

use shared::SharedError;
use thiserror::Error;

/// The atomic menu write failed; nothing was persisted
///
/// Stores return this verbatim and the scheduler hands it to the caller
/// unchanged. Retrying is the caller's decision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Menu commit failed: {message}")]
pub struct CommitError {
    pub message: String,
}

impl CommitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum RotationError {
    #[error("No eligible dishes in corpus scope '{scope}'")]
    EmptyCorpus { scope: String },

    #[error("Only {available} eligible dishes for a menu of {requested}")]
    InsufficientCorpus { available: usize, requested: usize },

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error("A rotation run is already in progress for scope '{scope}'")]
    RunInProgress { scope: String },

    #[error("Rotation run {run_id} cancelled before commit")]
    Cancelled { run_id: String },

    #[error("Duplicate dish in corpus: {key}")]
    DuplicateDish { key: String },

    #[error("Corpus fetch failed: {message}")]
    CorpusError { message: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RotationError {
    pub fn config(field: impl Into<String>) -> Self {
        Self::ConfigurationError { field: field.into() }
    }

    pub fn corpus(message: impl Into<String>) -> Self {
        Self::CorpusError { message: message.into() }
    }
}

pub type RotationResult<T> = Result<T, RotationError>;
