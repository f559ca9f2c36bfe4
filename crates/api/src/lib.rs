//! Timeasy HTTP API.
//!
//! Exposes config, state, error handling and routes so the integration tests
//! and the binary entrypoint build the same application.

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
