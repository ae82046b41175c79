//! Database probe endpoints.
//!
//! `/mysql` and `/postgres` report failures through the status code.
//! `/mongo` answers 200 for everything and explains itself in the body,
//! except for missing variables under the strict policy.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::info;

use super::state::AppState;
use crate::config::MongoMissingEnvStatus;
use crate::probes::{ProbeError, ProbeKind, CA_CERT};

pub async fn mongo(State(state): State<AppState>) -> Response {
    let result = run(ProbeKind::Mongo, &state).await;
    mongo_response(result, state.mongo_missing_env)
}

pub async fn mysql(State(state): State<AppState>) -> Response {
    let result = run(ProbeKind::Mysql, &state).await;
    sql_response(ProbeKind::Mysql, result)
}

pub async fn postgres(State(state): State<AppState>) -> Response {
    let result = run(ProbeKind::Postgres, &state).await;
    sql_response(ProbeKind::Postgres, result)
}

async fn run(kind: ProbeKind, state: &AppState) -> Result<(), ProbeError> {
    let probe = kind.request(state.env.as_ref())?;
    let result = probe.connect().await;

    match &result {
        Ok(()) => info!(%kind, "probe succeeded"),
        Err(e) => info!(%kind, error = %e, "probe failed"),
    }
    result
}

fn mongo_response(result: Result<(), ProbeError>, policy: MongoMissingEnvStatus) -> Response {
    let err = match result {
        Ok(()) => return "connection & ping successful\n".into_response(),
        Err(err) => err,
    };

    if let ProbeError::MissingEnv(var) = err {
        let body = if var == CA_CERT {
            "CA_CERT env var missing\n"
        } else {
            "DATABASE_URL connection string missing\n"
        };
        let status = match policy {
            MongoMissingEnvStatus::Lenient => StatusCode::OK,
            MongoMissingEnvStatus::Strict => StatusCode::NOT_IMPLEMENTED,
        };
        return (status, body).into_response();
    }

    let stage = match &err {
        ProbeError::InvalidCaCert => return "appending certs from pem\n".into_response(),
        ProbeError::Connect(_) => "connection failed",
        ProbeError::Ping(_) => "ping failed",
        _ => "client creation failed",
    };
    let detail = err.detail().map_or_else(|| err.to_string(), str::to_string);

    format!("{stage}\n{detail}\n").into_response()
}

fn sql_response(kind: ProbeKind, result: Result<(), ProbeError>) -> Response {
    match result {
        Ok(()) => format!("Successfully connected and pinged {kind}.").into_response(),
        Err(ProbeError::MissingEnv(_)) => {
            (StatusCode::NOT_IMPLEMENTED, "no DATABASE_URL env var").into_response()
        }
        Err(ProbeError::InvalidUrl(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "parsing DATABASE_URL").into_response()
        }
        Err(err) => {
            let detail = err.detail().map_or_else(|| err.to_string(), str::to_string);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("error connecting to the database: {detail}"),
            )
                .into_response()
        }
    }
}
