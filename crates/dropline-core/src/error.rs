//! Error types for the messaging store

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Messaging store errors
#[derive(Debug, Error)]
pub enum Error {
    /// Reserved slot in the taxonomy; no current operation produces it
    #[error("No manager: {0}")]
    NoManager(String),

    /// Caller has no session directory entry at all
    #[error("No sessions for caller: {0}")]
    NoSession(String),

    /// A session or message-log lookup failed
    #[error("Not found: {0}")]
    NotFound(String),

    /// A session with this counterparty already exists
    #[error("Duplicate attempt: {0}")]
    DuplicateAttempt(String),

    /// Caller's session capacity is exhausted
    #[error("Maximum sessions reached: {0}")]
    MaxSessionsReached(String),

    /// Session log capacity is exhausted
    #[error("Maximum messages reached: {0}")]
    MaxMessageReached(String),

    /// Substrate failure
    #[error("Storage error: {0}")]
    Storage(String),
}
