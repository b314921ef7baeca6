use crate::api::AppState;
use crate::api::handlers;
use axum::Router;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, error, info, warn};

pub const MISSING_BUILD: &str =
    "Frontend build not found. Run 'npm install' and 'npm run build' inside /front.";

/// Serves files from the build directory for every unmatched path, falling back to
/// `index.html` so client-side routes resolve.
///
/// The directory is looked up per request, so a build produced while the server runs
/// is picked up without a restart.
pub fn attach(router: Router<AppState>, frontend_dir: &Path) -> Router<AppState> {
    if frontend_dir.is_dir() {
        info!(dir = %frontend_dir.display(), "Serving frontend build");
    } else {
        warn!(dir = %frontend_dir.display(), "Frontend build not found");
    }

    let dir: Arc<PathBuf> = Arc::new(frontend_dir.to_path_buf());
    router.fallback(move |request: Request| {
        let dir = Arc::clone(&dir);
        async move { serve(&dir, request).await }
    })
}

async fn serve(dir: &Path, request: Request) -> Response {
    // Anything that looks like a rates path is an API miss, not a client-side route.
    if request.uri().path().trim_start_matches('/').starts_with("rates") {
        return handlers::not_found().await;
    }

    let exists = tokio::fs::metadata(dir)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if !exists {
        debug!(dir = %dir.display(), path = %request.uri().path(), "No frontend build to serve");
        return (StatusCode::INTERNAL_SERVER_ERROR, MISSING_BUILD).into_response();
    }

    let index = ServeFile::new(dir.join("index.html"));
    match ServeDir::new(dir).fallback(index).try_call(request).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to serve frontend file");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
