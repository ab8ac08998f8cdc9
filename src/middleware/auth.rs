use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::AuthError;
use crate::response::AppError;
use crate::state::AppState;

/// Rejects the request with 401 unless it carries a valid bearer token for
/// an existing account; on success the `AuthUser` is put in the extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = crate::auth::extract_bearer(req.headers()) else {
        return AppError::unauthorized("No token").into_response();
    };

    let claims = match crate::auth::verify_token(&state.config().jwt, &token) {
        Ok(claims) => claims,
        Err(err) => {
            if matches!(err, AuthError::Expired) {
                tracing::debug!("expired token presented");
            }
            return AppError::unauthorized("Token inválido").into_response();
        }
    };

    match crate::db::operations::user::find_auth_user(state.db_proxy(), claims.user_id).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(None) => AppError::unauthorized("Token inválido").into_response(),
        Err(err) => {
            tracing::error!(error = %err, user_id = claims.user_id, "auth user lookup failed");
            AppError::server().into_response()
        }
    }
}
