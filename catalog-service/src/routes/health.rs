use crate::models::responses::HealthResponse;
use crate::routes::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use tracing::warn;

/// Reports `running` only while the book store answers.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status) = match state.store.test_connection().await {
        Ok(()) => (StatusCode::OK, "running"),
        Err(e) => {
            warn!("Health check could not reach the book store: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
        }
    };

    (
        code,
        Json(HealthResponse {
            service: "catalog-service".to_string(),
            status: status.to_string(),
        }),
    )
}
