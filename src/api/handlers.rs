use crate::api::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::debug;

pub const NOT_READY: &str = "Exchange rate data is not yet available.";

pub async fn get_rates(State(state): State<AppState>) -> Response {
    match state.gate.cache().read() {
        Some(snapshot) => {
            debug!(base = %snapshot.base(), fetched_at = %snapshot.fetched_at(), "Serving cached rates");
            (
                [(header::CONTENT_TYPE, "application/json")],
                snapshot.body().to_string(),
            )
                .into_response()
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": NOT_READY })),
        )
            .into_response(),
    }
}

/// Paths starting with `rates` never fall through to the frontend.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}
