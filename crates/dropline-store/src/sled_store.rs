//! Durable sled-backed substrate
//!
//! One named tree per collection; values are bincode-encoded lists.

use std::path::Path;

use sled::{Db, Tree};
use tracing::{debug, info};

use dropline_core::error::{Error, Result};
use dropline_core::message::Message;
use dropline_core::notification::Notification;
use dropline_core::session::{Session, SessionId};
use dropline_core::storage::{
    DirectoryStore, MessageLogStore, NotificationStore, Storage, StoreStats,
};
use dropline_core::types::UserId;

/// Tree names
const TREE_DIRECTORY: &str = "directory";
const TREE_MESSAGE_LOGS: &str = "message_logs";
const TREE_NOTIFICATIONS: &str = "notifications";

/// Sled-backed storage
pub struct SledStorage {
    db: Db,
    directory: Tree,
    message_logs: Tree,
    notifications: Tree,
}

impl SledStorage {
    /// Open storage at the given path, creating it if missing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path).map_err(|e| Error::Storage(e.to_string()))?;

        let directory = db
            .open_tree(TREE_DIRECTORY)
            .map_err(|e| Error::Storage(e.to_string()))?;
        let message_logs = db
            .open_tree(TREE_MESSAGE_LOGS)
            .map_err(|e| Error::Storage(e.to_string()))?;
        let notifications = db
            .open_tree(TREE_NOTIFICATIONS)
            .map_err(|e| Error::Storage(e.to_string()))?;

        info!(
            "messaging store opened with {} directory entries, {} message logs",
            directory.len(),
            message_logs.len()
        );

        Ok(Self {
            db,
            directory,
            message_logs,
            notifications,
        })
    }

    fn get_list<T: serde::de::DeserializeOwned>(
        tree: &Tree,
        key: &[u8],
    ) -> Result<Option<Vec<T>>> {
        match tree.get(key) {
            Ok(Some(data)) => {
                let list = bincode::deserialize(&data)
                    .map_err(|e| Error::Storage(e.to_string()))?;
                Ok(Some(list))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(Error::Storage(e.to_string())),
        }
    }

    fn put_list<T: serde::Serialize>(tree: &Tree, key: &[u8], list: &[T]) -> Result<()> {
        let data = bincode::serialize(list).map_err(|e| Error::Storage(e.to_string()))?;
        tree.insert(key, data)
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    fn remove_key(tree: &Tree, key: &[u8]) -> Result<()> {
        tree.remove(key)
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }
}

impl DirectoryStore for SledStorage {
    fn directory(&self, owner: &UserId) -> Result<Option<Vec<Session>>> {
        Self::get_list(&self.directory, owner.as_str().as_bytes())
    }

    fn put_directory(&self, owner: &UserId, sessions: &[Session]) -> Result<()> {
        Self::put_list(&self.directory, owner.as_str().as_bytes(), sessions)
    }

    fn remove_directory(&self, owner: &UserId) -> Result<()> {
        Self::remove_key(&self.directory, owner.as_str().as_bytes())
    }
}

impl MessageLogStore for SledStorage {
    fn message_log(&self, id: SessionId) -> Result<Option<Vec<Message>>> {
        Self::get_list(&self.message_logs, &id.as_u64().to_be_bytes())
    }

    fn put_message_log(&self, id: SessionId, log: &[Message]) -> Result<()> {
        Self::put_list(&self.message_logs, &id.as_u64().to_be_bytes(), log)
    }

    fn remove_message_log(&self, id: SessionId) -> Result<()> {
        debug!("removing message log for session {}", id);
        Self::remove_key(&self.message_logs, &id.as_u64().to_be_bytes())
    }

    fn contains_message_log(&self, id: SessionId) -> Result<bool> {
        self.message_logs
            .contains_key(id.as_u64().to_be_bytes())
            .map_err(|e| Error::Storage(e.to_string()))
    }
}

impl NotificationStore for SledStorage {
    fn notifications(&self, recipient: &UserId) -> Result<Option<Vec<Notification>>> {
        Self::get_list(&self.notifications, recipient.as_str().as_bytes())
    }

    fn put_notifications(&self, recipient: &UserId, queue: &[Notification]) -> Result<()> {
        Self::put_list(&self.notifications, recipient.as_str().as_bytes(), queue)
    }

    fn remove_notifications(&self, recipient: &UserId) -> Result<()> {
        Self::remove_key(&self.notifications, recipient.as_str().as_bytes())
    }
}

impl Storage for SledStorage {
    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats> {
        let mut notification_count = 0;
        for item in self.notifications.iter() {
            let (_, value) = item.map_err(|e| Error::Storage(e.to_string()))?;
            let queue: Vec<Notification> = bincode::deserialize(&value)
                .map_err(|e| Error::Storage(e.to_string()))?;
            notification_count += queue.len();
        }

        Ok(StoreStats {
            directory_count: self.directory.len(),
            message_log_count: self.message_logs.len(),
            notification_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_round_trip() {
        let temp = TempDir::new().unwrap();
        let storage = SledStorage::open(temp.path()).unwrap();
        let alice = UserId::from_string("alice");

        assert!(storage.directory(&alice).unwrap().is_none());

        let sessions = vec![Session {
            id: SessionId::from_u64(11),
            counterparty: UserId::from_string("bob"),
        }];
        storage.put_directory(&alice, &sessions).unwrap();
        assert_eq!(storage.directory(&alice).unwrap(), Some(sessions));

        storage.remove_directory(&alice).unwrap();
        assert!(storage.directory(&alice).unwrap().is_none());
    }

    #[test]
    fn test_message_log_round_trip() {
        let temp = TempDir::new().unwrap();
        let storage = SledStorage::open(temp.path()).unwrap();
        let id = SessionId::from_u64(99);

        storage.put_message_log(id, &[]).unwrap();
        assert!(storage.contains_message_log(id).unwrap());

        let log = vec![Message::new(
            UserId::from_string("alice"),
            UserId::from_string("bob"),
            "hello",
        )];
        storage.put_message_log(id, &log).unwrap();
        assert_eq!(storage.message_log(id).unwrap(), Some(log));

        storage.remove_message_log(id).unwrap();
        assert!(!storage.contains_message_log(id).unwrap());
    }

    #[test]
    fn test_notifications_round_trip() {
        let temp = TempDir::new().unwrap();
        let storage = SledStorage::open(temp.path()).unwrap();
        let bob = UserId::from_string("bob");

        let queue = vec![Notification::new(
            UserId::from_string("alice"),
            SessionId::from_u64(11),
        )];
        storage.put_notifications(&bob, &queue).unwrap();
        assert_eq!(storage.notifications(&bob).unwrap(), Some(queue));

        let stats = storage.stats().unwrap();
        assert_eq!(stats.notification_count, 1);
    }

    #[test]
    fn test_state_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let alice = UserId::from_string("alice");
        let id = SessionId::from_u64(7);

        {
            let storage = SledStorage::open(temp.path()).unwrap();
            let sessions = vec![Session {
                id,
                counterparty: UserId::from_string("bob"),
            }];
            storage.put_directory(&alice, &sessions).unwrap();
            storage.put_message_log(id, &[]).unwrap();
            storage.flush().unwrap();
        }

        let storage = SledStorage::open(temp.path()).unwrap();
        assert_eq!(storage.directory(&alice).unwrap().unwrap().len(), 1);
        assert!(storage.contains_message_log(id).unwrap());
    }
}
