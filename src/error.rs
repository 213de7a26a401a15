//! Error types for loading, training and querying the classifier.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MushroomError {
    #[error("dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("target column `{0}` missing from CSV header")]
    MissingTarget(String),

    #[error("row {row}: invalid class label `{label}` (expected `e` or `p`)")]
    InvalidLabel { row: usize, label: String },

    #[error("dataset contains no records")]
    EmptyDataset,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("training failed: {0}")]
    Training(String),
}

impl MushroomError {
    pub(crate) fn training(err: impl std::fmt::Display) -> Self {
        MushroomError::Training(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MushroomError>;
