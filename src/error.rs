use std::path::PathBuf;
use thiserror::Error;

use crate::table::Table;

pub type Result<T, E = SlcspError> = std::result::Result<T, E>;

/// The two failure classes a run can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An input table could not be read or understood.
    Parse,
    /// The output table could not be written.
    Write,
}

#[derive(Debug, Error)]
pub enum SlcspError {
    #[error("failed to open {table} table at {}", .path.display())]
    Open {
        table: Table,
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed {table} table near line {line}")]
    Parse {
        table: Table,
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("{table} table has no `{column}` column")]
    MissingColumn { table: Table, column: &'static str },

    #[error("invalid rate `{value}` in {table} table at line {line}")]
    InvalidRate {
        table: Table,
        line: u64,
        value: String,
        #[source]
        source: rust_decimal::Error,
    },

    #[error("{table} loader did not complete")]
    Task {
        table: Table,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("failed to write output to {destination}")]
    Write {
        destination: String,
        #[source]
        source: std::io::Error,
    },
}

impl SlcspError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SlcspError::Write { .. } => ErrorKind::Write,
            _ => ErrorKind::Parse,
        }
    }

    /// Wrap a csv error raised while reading `table`, keeping the line it failed on.
    pub(crate) fn parse(table: Table, source: csv::Error) -> Self {
        let line = source.position().map(|p| p.line()).unwrap_or(0);
        SlcspError::Parse {
            table,
            line,
            source,
        }
    }
}
