//! Request handlers.
//!
//! Thin translation layer between HTTP and `vlearn-core`; every handler
//! builds a `Store` and the relevant generator/orchestrator from `AppState`
//! and maps the core's `Result` straight onto the wire response.

pub mod credits;
pub mod health;
pub mod notes;
pub mod quiz;
pub mod reports;
pub mod videos;

pub use health::*;
