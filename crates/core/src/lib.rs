//! Timeasy domain core.
//!
//! Everything in this crate is free of I/O: the domain entities and their
//! invariants, the authorisation kernel, change-feed classification for the
//! sync protocol, and the persistence port traits the adapters implement.

pub mod access;
pub mod clock;
pub mod error;
pub mod identity;
pub mod models;
pub mod ports;
pub mod roles;
pub mod sync;
pub mod types;
pub mod validation;
