//! HTTP surface: the rates endpoint plus the prebuilt frontend

pub mod frontend;
pub mod handlers;

use crate::core::gate::StartupGate;
use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<StartupGate>,
}

impl AppState {
    pub fn new(gate: Arc<StartupGate>) -> Self {
        Self { gate }
    }
}

mod urls {
    pub const RATES: &str = "/rates";
}

pub fn router(state: AppState, frontend_dir: &Path) -> Router {
    let api = Router::new().route(urls::RATES, get(handlers::get_rates));

    frontend::attach(api, frontend_dir)
        .layer(middleware::from_fn_with_state(state.clone(), ensure_started))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Every request, static or not, waits for the first rate load.
async fn ensure_started(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.gate.ensure_started().await;
    next.run(request).await
}
