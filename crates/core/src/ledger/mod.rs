//! Audit ledger vocabulary.
//!
//! The ledger itself is an append-only table owned by the database layer;
//! this module holds the pure vocabulary it is written with: the event
//! codes, their categories, typed entity references, and notification
//! channels.

pub mod types;

pub use types::{Channel, EntityRef, EventCategory, EventCode};
