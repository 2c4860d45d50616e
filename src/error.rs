// ❗ Pipeline errors
// Everything the library can fail with; absence of matching rows is NOT an error

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column `{0}` is missing from the header row")]
    MissingColumn(String),

    /// Every row was dropped (or unreadable); downstream stages are undefined
    #[error("no usable rows: {total_rows} rows read, {dropped_rows} dropped during normalization")]
    EmptyDataset {
        total_rows: usize,
        dropped_rows: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the terminal "no data" condition raised after normalization
    pub fn is_no_data(&self) -> bool {
        matches!(self, PipelineError::EmptyDataset { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
