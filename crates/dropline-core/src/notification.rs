//! Unread-message notifications

use serde::{Deserialize, Serialize};

use crate::session::SessionId;
use crate::types::{Timestamp, UserId};

/// Marker that at least one unread message from `sender` waits in session
/// `session_id`.
///
/// One is appended per send; duplicates for the same session accumulate
/// until the recipient views it, at which point all markers for that id are
/// cleared together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Who sent the unread message
    pub sender: UserId,
    /// Session holding the unread message
    pub session_id: SessionId,
    /// When the message was sent
    pub timestamp: Timestamp,
}

impl Notification {
    /// Create a new notification stamped with the current time
    pub fn new(sender: UserId, session_id: SessionId) -> Self {
        Self {
            sender,
            session_id,
            timestamp: Timestamp::now(),
        }
    }
}
