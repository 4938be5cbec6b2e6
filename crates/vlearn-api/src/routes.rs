//! API routes.

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::handlers::credits::get_credits;
use crate::handlers::health::{health, ready};
use crate::handlers::notes::generate as generate_notes;
use crate::handlers::quiz::{generate as generate_quiz, submit as submit_quiz};
use crate::handlers::reports::{generate as generate_report, record_attempt};
use crate::handlers::videos::{delete_video, get_status, get_video, process_async};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let video_routes = Router::new()
        .route("/video/process-async", post(process_async))
        .route("/video/:video_id/status", get(get_status))
        .route("/video/:video_id", get(get_video))
        .route("/video/:video_id", delete(delete_video));

    let quiz_routes = Router::new()
        .route("/quiz/generate", post(generate_quiz))
        .route("/quiz/submit", post(submit_quiz));

    let notes_routes = Router::new().route("/notes/generate", post(generate_notes));

    let report_routes = Router::new()
        .route("/reports/attempt", post(record_attempt))
        .route("/reports/generate", post(generate_report));

    let credit_routes = Router::new().route("/users/:user_id/credits", get(get_credits));

    // Create rate limiter for API routes
    let rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(video_routes)
        .merge(quiz_routes)
        .merge(notes_routes)
        .merge(report_routes)
        .merge(credit_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
