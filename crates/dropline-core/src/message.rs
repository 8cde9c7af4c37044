//! Message records

use serde::{Deserialize, Serialize};

use crate::types::{Timestamp, UserId};

/// One message inside a session log.
///
/// Immutable once appended; insertion order is the only ordering guarantee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender's user ID
    pub sender: UserId,
    /// Receiver's user ID
    pub receiver: UserId,
    /// Message text
    pub text: String,
    /// Creation timestamp
    pub timestamp: Timestamp,
}

impl Message {
    /// Create a new message stamped with the current time
    pub fn new(sender: UserId, receiver: UserId, text: impl Into<String>) -> Self {
        Self {
            sender,
            receiver,
            text: text.into(),
            timestamp: Timestamp::now(),
        }
    }
}
