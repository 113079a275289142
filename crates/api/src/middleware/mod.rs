//! Request middleware and extractors.

pub mod actor;

pub use actor::Actor;
