//! # Dropline Store
//!
//! Session, messaging, and query layers of the Dropline directed messaging
//! store, atop a pluggable key-value substrate.
//!
//! Callers reach this crate already authenticated; transport and wire
//! encoding live outside it. Operations assume the substrate's
//! run-to-completion call discipline: each mutating call finishes before
//! the next begins, so single-key get/put pairs read consistent state.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod messaging;
pub mod query;
pub mod sessions;
pub mod sled_store;

pub use config::StoreConfig;
pub use messaging::MessagingEngine;
pub use query::QueryLayer;
pub use sessions::SessionManager;
pub use sled_store::SledStorage;
