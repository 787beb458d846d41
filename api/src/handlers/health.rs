use axum::{http::StatusCode, response::IntoResponse};

/// Liveness probe.
#[tracing::instrument]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
