use super::Format;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse {format}: {details} (at line ~{line})")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    #[error("atom style '{0}' is not supported by the data-file writer")]
    UnsupportedAtomStyle(String),

    #[error("species '{0}' is not a known element symbol")]
    UnknownElement(String),

    #[error("failed to convert structure: {0}")]
    Conversion(String),
}

impl Error {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }
}
