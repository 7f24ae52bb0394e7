// ============================================================
// Layer 3 - Error Taxonomy
// ============================================================
// Every fatal condition of a training run falls in one of
// these enums. Lower layers return them directly; the
// application layer wraps them in anyhow with context.
//
//   ConfigError     - bad model name, malformed arguments,
//                     impossible sizes (raised before training)
//   DataError       - unreadable corpus, missing fields, bad labels
//   TrainError      - numeric failure or bad label inside a batch
//   CheckpointError - checkpoint cannot be written or read back
//
// An unavailable accelerator is not an error: the device
// resolver falls back to CPU.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown model '{name}' (registered models: {available})")]
    UnknownModel { name: String, available: String },

    #[error("Malformed literal for '{field}': {value:?} ({reason})")]
    MalformedLiteral {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Malformed keyword argument {0:?}: expected key=literal")]
    MalformedKeyword(String),

    #[error("{model}: {reason}")]
    ArgumentMismatch { model: String, reason: String },

    #[error("{model}: missing required argument '{field}'")]
    MissingArgument { model: String, field: String },

    #[error("{model}: argument '{field}' expects {expected}, got {found}")]
    InvalidArgument {
        model: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error("Dictionary size must be at least 2 (padding and unknown ids are reserved), got {0}")]
    CapacityTooSmall(usize),

    #[error("Invalid setting '{field}': {reason}")]
    InvalidSetting { field: String, reason: String },
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Cannot read corpus '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Corpus '{path}' has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Row {row}: missing value for '{column}'")]
    MissingField { row: usize, column: String },

    #[error("Row {row}: label {value:?} is not a non-negative integer")]
    InvalidLabel { row: usize, value: String },
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Epoch {epoch}, batch {batch}: loss is not finite ({value})")]
    NonFiniteLoss { epoch: usize, batch: usize, value: f64 },

    #[error("Epoch {epoch}, batch {batch}: label {label} out of range for {num_classes} classes")]
    LabelOutOfRange {
        epoch: usize,
        batch: usize,
        label: i64,
        num_classes: usize,
    },

    #[error("Training already completed")]
    AlreadyCompleted,

    #[error("Training was aborted during epoch {epoch} and cannot be resumed")]
    Aborted { epoch: usize },
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot encode model parameters: {0}")]
    Record(String),

    #[error("Checkpoint encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Checkpoint model config is invalid: {0}")]
    ModelConfig(#[from] serde_json::Error),

    #[error("Unsupported checkpoint format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Checkpoint vocabulary is invalid: {0}")]
    Vocabulary(String),
}
