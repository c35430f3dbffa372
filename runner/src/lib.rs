//! Actor runner - synchronous-looking execution of platform actor runs
//!
//! This crate submits actor runs to the external platform, polls them to a
//! terminal outcome within a fixed budget, and exposes the result through a
//! small HTTP API.

pub mod api;
pub mod config;
pub mod orchestrator;
pub mod platform;
pub mod progress;
pub mod schema;
pub mod state;

pub use state::AppState;
