use axum::extract::State;
use axum::Json;
use bytes::Bytes;

use crate::response::AppError;
use crate::routes::parse_body;
use crate::services::account::{self, AccountError, AuthSession, LoginInput, RegisterInput};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AuthSession>, AppError> {
    let fields = parse_body(&body)?;
    let input = RegisterInput::from_json(
        fields.get("username"),
        fields.get("password"),
        fields.get("age"),
    )
    .map_err(account_error)?;

    let session = account::register(state.db_proxy(), &state.config().jwt, input)
        .await
        .map_err(account_error)?;
    Ok(Json(session))
}

pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AuthSession>, AppError> {
    let fields = parse_body(&body)?;
    let input = LoginInput::from_json(fields.get("username"), fields.get("password"))
        .map_err(account_error)?;

    let session = account::login(state.db_proxy(), &state.config().jwt, input)
        .await
        .map_err(account_error)?;
    Ok(Json(session))
}

fn account_error(err: AccountError) -> AppError {
    match err {
        AccountError::Validation(message) => AppError::validation(message),
        AccountError::UsernameTaken => AppError::conflict("Este nombre de usuario ya existe"),
        AccountError::InvalidCredentials => {
            AppError::unauthorized("Usuario o contraseña incorrectos")
        }
        other => {
            tracing::error!(error = %other, "account request failed");
            AppError::server()
        }
    }
}
