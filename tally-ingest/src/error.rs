use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The file does not have the fixed layout we expect
    #[error("malformed input {origin} (line {line}): {reason}")]
    MalformedInput {
        origin: String,
        line: u64,
        reason: String,
    },

    #[error("read {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },
}

impl IngestError {
    pub fn malformed(origin: &str, line: u64, reason: impl Into<String>) -> Self {
        IngestError::MalformedInput {
            origin: origin.to_string(),
            line,
            reason: reason.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        IngestError::Io {
            origin: path.display().to_string(),
            source,
        }
    }

    pub fn csv(origin: &str, source: csv::Error) -> Self {
        IngestError::Csv {
            origin: origin.to_string(),
            source,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, IngestError::MalformedInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
