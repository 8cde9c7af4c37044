//! Storage traits for the messaging store
//!
//! Defines the key-value substrate the store components sit on, one trait
//! per collection, implementable for different backends (sled, memory,
//! etc.). Each method is an atomic single-key get/insert/remove; callers
//! are expected to serialize mutating operations externally, so no method
//! needs to coordinate across keys.

use crate::error::Result;
use crate::message::Message;
use crate::notification::Notification;
use crate::session::{Session, SessionId};
use crate::types::UserId;

/// Storage for per-caller session directories
pub trait DirectoryStore: Send + Sync {
    /// Get a caller's session list
    fn directory(&self, owner: &UserId) -> Result<Option<Vec<Session>>>;

    /// Replace a caller's session list, creating the entry if absent
    fn put_directory(&self, owner: &UserId, sessions: &[Session]) -> Result<()>;

    /// Remove a caller's directory entry
    fn remove_directory(&self, owner: &UserId) -> Result<()>;
}

/// Storage for per-session message logs
pub trait MessageLogStore: Send + Sync {
    /// Get the ordered log for a session
    fn message_log(&self, id: SessionId) -> Result<Option<Vec<Message>>>;

    /// Replace the log for a session, creating the entry if absent
    fn put_message_log(&self, id: SessionId, log: &[Message]) -> Result<()>;

    /// Remove a session's log entirely
    fn remove_message_log(&self, id: SessionId) -> Result<()>;

    /// Whether a log entry exists for this id
    fn contains_message_log(&self, id: SessionId) -> Result<bool>;
}

/// Storage for per-recipient notification queues
pub trait NotificationStore: Send + Sync {
    /// Get a recipient's queued notifications
    fn notifications(&self, recipient: &UserId) -> Result<Option<Vec<Notification>>>;

    /// Replace a recipient's queue, creating the entry if absent
    fn put_notifications(&self, recipient: &UserId, queue: &[Notification]) -> Result<()>;

    /// Remove a recipient's queue entirely
    fn remove_notifications(&self, recipient: &UserId) -> Result<()>;
}

/// Combined substrate interface
pub trait Storage: DirectoryStore + MessageLogStore + NotificationStore {
    /// Flush pending writes to durable media
    fn flush(&self) -> Result<()>;

    /// Get storage stats
    fn stats(&self) -> Result<StoreStats>;
}

/// Storage statistics
#[derive(Clone, Debug, Default)]
pub struct StoreStats {
    /// Callers holding a directory entry
    pub directory_count: usize,
    /// Live message logs
    pub message_log_count: usize,
    /// Queued notifications across all recipients
    pub notification_count: usize,
}

/// In-memory storage for tests and embedding
pub mod memory {
    use std::collections::HashMap;

    use parking_lot::RwLock;

    use super::*;

    /// In-memory storage implementation
    pub struct MemoryStorage {
        directory: RwLock<HashMap<UserId, Vec<Session>>>,
        message_logs: RwLock<HashMap<SessionId, Vec<Message>>>,
        notifications: RwLock<HashMap<UserId, Vec<Notification>>>,
    }

    impl MemoryStorage {
        /// Create new in-memory storage
        pub fn new() -> Self {
            Self {
                directory: RwLock::new(HashMap::new()),
                message_logs: RwLock::new(HashMap::new()),
                notifications: RwLock::new(HashMap::new()),
            }
        }
    }

    impl Default for MemoryStorage {
        fn default() -> Self {
            Self::new()
        }
    }

    impl DirectoryStore for MemoryStorage {
        fn directory(&self, owner: &UserId) -> Result<Option<Vec<Session>>> {
            Ok(self.directory.read().get(owner).cloned())
        }

        fn put_directory(&self, owner: &UserId, sessions: &[Session]) -> Result<()> {
            self.directory
                .write()
                .insert(owner.clone(), sessions.to_vec());
            Ok(())
        }

        fn remove_directory(&self, owner: &UserId) -> Result<()> {
            self.directory.write().remove(owner);
            Ok(())
        }
    }

    impl MessageLogStore for MemoryStorage {
        fn message_log(&self, id: SessionId) -> Result<Option<Vec<Message>>> {
            Ok(self.message_logs.read().get(&id).cloned())
        }

        fn put_message_log(&self, id: SessionId, log: &[Message]) -> Result<()> {
            self.message_logs.write().insert(id, log.to_vec());
            Ok(())
        }

        fn remove_message_log(&self, id: SessionId) -> Result<()> {
            self.message_logs.write().remove(&id);
            Ok(())
        }

        fn contains_message_log(&self, id: SessionId) -> Result<bool> {
            Ok(self.message_logs.read().contains_key(&id))
        }
    }

    impl NotificationStore for MemoryStorage {
        fn notifications(&self, recipient: &UserId) -> Result<Option<Vec<Notification>>> {
            Ok(self.notifications.read().get(recipient).cloned())
        }

        fn put_notifications(&self, recipient: &UserId, queue: &[Notification]) -> Result<()> {
            self.notifications
                .write()
                .insert(recipient.clone(), queue.to_vec());
            Ok(())
        }

        fn remove_notifications(&self, recipient: &UserId) -> Result<()> {
            self.notifications.write().remove(recipient);
            Ok(())
        }
    }

    impl Storage for MemoryStorage {
        fn flush(&self) -> Result<()> {
            Ok(())
        }

        fn stats(&self) -> Result<StoreStats> {
            Ok(StoreStats {
                directory_count: self.directory.read().len(),
                message_log_count: self.message_logs.read().len(),
                notification_count: self.notifications.read().values().map(Vec::len).sum(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStorage;
    use super::*;

    #[test]
    fn test_directory_operations() {
        let storage = MemoryStorage::new();
        let alice = UserId::from_string("alice");

        assert!(storage.directory(&alice).unwrap().is_none());

        let sessions = vec![Session {
            id: SessionId::from_u64(1),
            counterparty: UserId::from_string("bob"),
        }];
        storage.put_directory(&alice, &sessions).unwrap();
        assert_eq!(storage.directory(&alice).unwrap(), Some(sessions));

        storage.put_directory(&alice, &[]).unwrap();
        assert_eq!(storage.directory(&alice).unwrap(), Some(Vec::new()));

        storage.remove_directory(&alice).unwrap();
        assert!(storage.directory(&alice).unwrap().is_none());
    }

    #[test]
    fn test_message_log_operations() {
        let storage = MemoryStorage::new();
        let id = SessionId::from_u64(42);

        assert!(!storage.contains_message_log(id).unwrap());

        storage.put_message_log(id, &[]).unwrap();
        assert!(storage.contains_message_log(id).unwrap());
        assert_eq!(storage.message_log(id).unwrap(), Some(Vec::new()));

        storage.remove_message_log(id).unwrap();
        assert!(storage.message_log(id).unwrap().is_none());
    }

    #[test]
    fn test_stats_reflect_population() {
        let storage = MemoryStorage::new();
        let alice = UserId::from_string("alice");
        let bob = UserId::from_string("bob");

        storage.put_directory(&alice, &[]).unwrap();
        storage.put_message_log(SessionId::from_u64(1), &[]).unwrap();
        let queue = vec![
            Notification::new(alice.clone(), SessionId::from_u64(1)),
            Notification::new(alice, SessionId::from_u64(1)),
        ];
        storage.put_notifications(&bob, &queue).unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.directory_count, 1);
        assert_eq!(stats.message_log_count, 1);
        assert_eq!(stats.notification_count, 2);
    }
}
