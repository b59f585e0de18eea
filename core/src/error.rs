//! Error types for the entry store.

use std::fmt;

use thiserror::Error;

/// Failures reported by the storage engine itself.
#[derive(Error, Debug)]
pub enum EngineError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The blocking task running the operation panicked or was cancelled
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("schema version must be at least 1")]
    ZeroVersion,

    #[error("schema version {requested} is newer than the latest known version {latest}")]
    UnsupportedVersion { requested: u32, latest: u32 },

    #[error("requested schema version {requested} is lower than the stored version {stored}")]
    Downgrade { requested: u32, stored: u32 },

    /// The date has no four-digit `YYYY-MM-DD` form
    #[error("date {0} is outside the storable range")]
    DateOutOfRange(chrono::NaiveDate),
}

/// Which write operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Add,
    Update,
    Delete,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Error returned by every [`EntryStore`](crate::store::EntryStore) operation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to open calorie database")]
    Open {
        #[source]
        source: EngineError,
    },

    #[error("failed to {op} calorie entry")]
    Write {
        op: WriteOp,
        #[source]
        source: EngineError,
    },

    #[error("failed to read calorie entries")]
    Read {
        #[source]
        source: EngineError,
    },
}

impl StoreError {
    pub(crate) fn open(source: impl Into<EngineError>) -> Self {
        Self::Open {
            source: source.into(),
        }
    }

    pub(crate) fn write(op: WriteOp, source: impl Into<EngineError>) -> Self {
        Self::Write {
            op,
            source: source.into(),
        }
    }

    pub(crate) fn read(source: impl Into<EngineError>) -> Self {
        Self::Read {
            source: source.into(),
        }
    }

    /// The message shown to the user in place of the failed operation's result.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Open { .. } => {
                "Failed to initialize database. Please reload and try again.".to_string()
            }
            Self::Write { op, .. } => format!("Failed to {op} calorie entry. Please try again."),
            Self::Read { .. } => "Failed to fetch calorie entries. Please try again.".to_string(),
        }
    }
}
