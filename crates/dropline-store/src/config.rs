//! Store configuration

use dropline_core::{DEFAULT_MAX_SESSIONS, DEFAULT_MAX_SESSION_MESSAGES};
use serde::{Deserialize, Serialize};

/// Capacity limits for the messaging store
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum sessions a caller may create
    pub max_sessions: usize,
    /// Maximum messages retained in one session log
    pub max_session_messages: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            max_session_messages: DEFAULT_MAX_SESSION_MESSAGES,
        }
    }
}

impl StoreConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_sessions == 0 {
            return Err("max_sessions must be > 0".to_string());
        }
        if self.max_session_messages == 0 {
            return Err("max_session_messages must be > 0".to_string());
        }
        Ok(())
    }
}
