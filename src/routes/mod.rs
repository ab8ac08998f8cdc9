mod auth;
mod health;
mod progress;
mod users;

use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use serde_json::{Map, Value};

use crate::middleware::auth::require_auth;
use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/me", get(users::me))
        .route("/progress", post(progress::record))
        .route("/video-view", post(progress::video_view))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(protected)
        .nest("/health", health::router());

    Router::new()
        .nest("/api", api)
        .fallback(fallback_handler)
        .with_state(state)
}

/// Reads a request body as a JSON object. An empty body or a non-object
/// value yields no fields, so the handler reports the missing ones.
pub(crate) fn parse_body(body: &Bytes) -> Result<Map<String, Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Ok(Map::new()),
        Err(_) => Err(AppError::validation("JSON inválido")),
    }
}

async fn fallback_handler() -> Response {
    AppError::not_found("Ruta no encontrada").into_response()
}
