//! Error types for the star selection pipeline.
//!
//! Every failure is fatal for the run: nothing is retried and no partial data
//! stream is written. The binaries turn an error into a single tagged log line
//! and exit with status 1.

use thiserror::Error;

/// Broad failure classes, used for the log tag and for test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing environment variable, configuration file, parameter or argument.
    Configuration,
    /// Input that was found but could not be interpreted.
    MalformedInput,
}

/// Errors raised while configuring or running a selection.
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("cannot open configuration file {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot find parameter {key} for station {station}")]
    MissingParameter { station: String, key: String },

    #[error("invalid value {value:?} for parameter {key}")]
    InvalidParameter { key: String, value: String },

    #[error("command line parameter error: {0}")]
    InvalidArguments(String),

    #[error("vignetting map format error: {0}")]
    MalformedVignetting(String),

    #[error("catalog header error: {0}")]
    MalformedHeader(String),

    #[error("catalog record {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SelectionError {
    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SelectionError::MissingEnv(_)
            | SelectionError::ConfigIo { .. }
            | SelectionError::MissingParameter { .. }
            | SelectionError::InvalidParameter { .. }
            | SelectionError::InvalidArguments(_) => ErrorKind::Configuration,
            SelectionError::MalformedVignetting(_)
            | SelectionError::MalformedHeader(_)
            | SelectionError::MalformedRecord { .. }
            | SelectionError::Io(_) => ErrorKind::MalformedInput,
        }
    }

    /// Short stage tag used as the log target when reporting a fatal error.
    pub fn stage(&self) -> &'static str {
        match self {
            SelectionError::MissingEnv(_)
            | SelectionError::ConfigIo { .. }
            | SelectionError::MissingParameter { .. }
            | SelectionError::InvalidParameter { .. } => "config",
            SelectionError::InvalidArguments(_) => "main",
            SelectionError::MalformedVignetting(_) => "vignetting",
            SelectionError::MalformedHeader(_) | SelectionError::MalformedRecord { .. } => {
                "catalog"
            }
            SelectionError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, SelectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let missing = SelectionError::MissingParameter {
            station: "CS".to_string(),
            key: "MINSEP".to_string(),
        };
        assert_eq!(missing.kind(), ErrorKind::Configuration);
        assert_eq!(missing.stage(), "config");
        assert_eq!(
            missing.to_string(),
            "cannot find parameter MINSEP for station CS"
        );

        let record = SelectionError::MalformedRecord {
            line: 17,
            reason: "expected 6 fields".to_string(),
        };
        assert_eq!(record.kind(), ErrorKind::MalformedInput);
        assert_eq!(record.stage(), "catalog");
    }
}
