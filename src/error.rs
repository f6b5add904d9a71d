// src/error.rs
use std::{io, path::Path};
use thiserror::Error;

/// Failures raised by the report engine.
///
/// Everything except a `Parse` of the initial input is recoverable from the
/// menu's point of view: the caller reports it and presents the menu again.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed preamble, header or row shape, or a cell that does not
    /// match its declared type.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Unknown operation code or non-numeric menu input.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Grouping over zero rows with no declared key domain.
    #[error("cannot {0}: the table has no rows")]
    EmptyInput(&'static str),

    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        EngineError::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(action: &str, path: &Path, source: io::Error) -> Self {
        EngineError::Io {
            context: format!("{} {}", action, path.display()),
            source,
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
