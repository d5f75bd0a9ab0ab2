//! Error types for the tools.

use std::path::PathBuf;

use heist_core::error::{DataError, GameError};
use thiserror::Error;

/// Result alias for tool operations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Errors raised while loading content or running the simulation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file or directory could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A content file failed to parse or validate.
    #[error("{}: {source}", path.display())]
    Content {
        /// Offending file.
        path: PathBuf,
        /// What was wrong with it.
        source: DataError,
    },

    /// A `.ron` file whose top-level type is not a known content kind.
    #[error("{}: unrecognised content type {found:?}", path.display())]
    UnknownContent {
        /// Offending file.
        path: PathBuf,
        /// The leading identifier, if any.
        found: String,
    },

    /// The simulation rejected an operation.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A battle did not finish within the step limit.
    #[error("battle against enemy {enemy} did not finish after {steps} steps")]
    BattleStalled {
        /// Spawn index of the engaged enemy.
        enemy: usize,
        /// Steps taken before giving up.
        steps: usize,
    },

    /// The run summary could not be serialized.
    #[error("failed to write report: {0}")]
    Report(#[from] ron::Error),
}

impl ToolError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn content(path: impl Into<PathBuf>, source: DataError) -> Self {
        Self::Content {
            path: path.into(),
            source,
        }
    }
}
