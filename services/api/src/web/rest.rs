//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints.

use axum::{http::StatusCode, response::IntoResponse};

/// Liveness probe for deployment health checks.
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
