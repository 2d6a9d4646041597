//! Vocabulary shared by every Parley crate: conversation roles, the reply
//! shape returned to clients, realtime wire frames and waiter tuning.

pub mod config;
pub mod events;
pub mod message;

pub use config::WaiterConfig;
pub use events::{ClientEvent, ServerEvent};
pub use message::{Reply, Role, FALLBACK_REPLY};
