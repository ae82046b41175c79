//! Info and variable lookup handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::state::AppState;

pub(super) fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found\n").into_response()
}

/// `GET /` -- hostname, server time, runtime env dump, raw build vars file.
///
/// Leaks every secret in the environment. This is a diagnostic tool.
pub async fn info(State(state): State<AppState>) -> String {
    let hostname = match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => return format!("error getting hostname: {e}"),
    };

    let mut body = format!(
        "hostname: {hostname}\nserver time: {}\n",
        chrono::Local::now()
    );

    body.push_str("\n\nRuntime Environment Variables:\n");
    for (key, value) in state.env.vars() {
        body.push_str(&format!("{key}={value}\n"));
    }

    body.push_str("\n\nBuildtime Environment Variables:\n");
    let path = state.build_vars_path.as_path();
    match tokio::fs::read(path).await {
        Ok(raw) => {
            body.push_str(&String::from_utf8_lossy(&raw));
            body.push('\n');
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read build vars file");
            body.push_str(&format!("error reading {}: {e}\n", path.display()));
        }
    }

    body
}

/// `GET /envs/build/{name}` -- a present key answers even when its value is empty.
pub async fn build_var(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.build_vars.get(&name) {
        Some(value) => format!("{value}\n").into_response(),
        None => not_found(),
    }
}

/// `GET /envs/run/{name}` -- unset and empty are indistinguishable, both 404.
pub async fn run_var(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.env.get(&name).filter(|v| !v.is_empty()) {
        Some(value) => format!("{value}\n").into_response(),
        None => not_found(),
    }
}
