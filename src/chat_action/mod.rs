//! Per-chat presence signals ("typing…", "uploading photo…") that stay alive
//! for as long as the operation producing the reply is in flight.

pub mod scheduler;
pub mod transport;

pub use scheduler::{ActionItem, ChatActionScheduler, DEFAULT_ANNOUNCE_INTERVAL};
