//! Axum HTTP API server.
//!
//! This crate provides the external interfaces described in section 6:
//! video submission and status polling, flashcard/quiz/notes/report
//! reads, credit balance, and per-attempt grading. Request handlers are
//! thin: all business logic lives in `vlearn-core` and the handlers only
//! translate HTTP <-> the core's types. HTTP routing, request
//! authentication, CORS, and configuration loading are the boundary
//! surfaces this crate owns directly; the async pipeline they front is
//! someone else's module.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
