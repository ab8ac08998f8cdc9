use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/ready", get(ready))
        .route("/info", get(info))
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadinessResponse {
    ok: bool,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database_latency_ms: Option<u64>,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoResponse {
    service: &'static str,
    version: &'static str,
    start_time: String,
    uptime: u64,
}

/// Liveness only; never touches the database.
async fn root() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

async fn ready(State(state): State<AppState>) -> Response {
    let check = tokio::time::timeout(DB_CHECK_TIMEOUT, state.db_proxy().ping()).await;

    let (database, latency) = match check {
        Ok(Ok(elapsed)) => ("connected", Some(elapsed.as_millis() as u64)),
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "readiness database check failed");
            ("disconnected", None)
        }
        Err(_) => ("timeout", None),
    };
    let ok = database == "connected";

    let response = ReadinessResponse {
        ok,
        database,
        database_latency_ms: latency,
        timestamp: now_iso(),
    };

    let status_code = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    let started: chrono::DateTime<chrono::Utc> = state.started_at_system().into();
    Json(InfoResponse {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        start_time: started.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        uptime: state.uptime_seconds(),
    })
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
