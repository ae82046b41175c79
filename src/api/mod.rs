//! API layer -- axum routes, handlers, and middleware.

mod dump;
mod probes;
mod routes;
pub mod state;
mod upload;

use self::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

/// Build the application router with all diagnostic routes.
pub fn router(state: AppState) -> Router {
    // Handlers whose inbound request is dumped to the log first.
    let dumped: Router<AppState> = Router::new()
        .route("/", get(routes::info))
        .route("/mongo", get(probes::mongo))
        .route("/mysql", get(probes::mysql))
        .route("/postgres", get(probes::postgres))
        .route_layer(middleware::from_fn(dump::log_request));

    let upload = get(upload::form)
        .post(upload::receive)
        .fallback(upload::unsupported)
        .layer(DefaultBodyLimit::max(state.upload_limit_bytes));

    Router::new()
        .merge(dumped)
        .route("/envs/build/{name}", get(routes::build_var))
        .route("/envs/run/{name}", get(routes::run_var))
        .route("/upload", upload)
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback() -> (axum::http::StatusCode, &'static str) {
    (axum::http::StatusCode::NOT_FOUND, "404 page not found\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
