//! Error taxonomy for the plan/apply pipeline.
//!
//! Per-file scan failures ([`ScanError`]) and per-instruction apply failures
//! ([`ApplyError`]) are recoverable: they are logged or recorded and the batch
//! goes on. Everything in [`Error`] is structural and aborts the operation.

use crate::session::SessionStatus;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Structural errors surfaced to the caller of a session operation.
#[derive(Debug, Error)]
pub enum Error {
    /// No session with this id exists in the store.
    #[error("Session not found: {0}")]
    NotFound(Uuid),

    /// The requested method or algorithm id is unknown or disabled.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The strategy is registered but has no implementation.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// The session state machine rejected a status change.
    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    /// Another apply of the same session is still running.
    #[error("Session {0} is already being applied")]
    ApplyInProgress(Uuid),

    /// The directory to scan is missing or is not a directory.
    #[error("Invalid directory {}: {reason}", .path.display())]
    InvalidDirectory { path: PathBuf, reason: String },

    /// Loading or compiling the configuration failed.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Reading or writing the session store failed.
    #[error("Session store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A single file that could not be described during a scan.
#[derive(Debug, Error)]
#[error("Failed to process {}: {source}", .path.display())]
pub struct ScanError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Why a single instruction failed to apply.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("source does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("directory does not exist: {}", .0.display())]
    DirectoryMissing(PathBuf),

    #[error("directory is not empty: {}", .0.display())]
    DirectoryNotEmpty(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{action} failed for {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A string did not name any variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
