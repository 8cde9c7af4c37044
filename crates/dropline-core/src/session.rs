//! Session records

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Unique session identifier.
///
/// Generated ids are drawn from `1..SESSION_ID_BOUND`; zero never names a
/// live session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Create from a raw id value
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Raw id value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One directory record: a session as seen by its owning caller.
///
/// A conversation between two parties is two of these records, one per
/// participant, sharing the same id while both sides keep theirs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Join key into the message log
    pub id: SessionId,
    /// The other participant
    pub counterparty: UserId,
}

/// Find the session naming `counterparty`, if any.
///
/// A linear scan; directory lists are bounded by the session cap.
pub fn find_by_counterparty<'a>(
    sessions: &'a [Session],
    counterparty: &UserId,
) -> Option<&'a Session> {
    sessions.iter().find(|s| s.counterparty == *counterparty)
}
