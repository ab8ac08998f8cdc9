use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::response::AppError;
use crate::services::user_profile::{self, UserProfile};
use crate::state::AppState;

#[derive(Serialize)]
pub struct MeResponse {
    user: UserProfile,
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<MeResponse>, AppError> {
    match user_profile::get_profile(state.db_proxy(), auth_user.id).await {
        Ok(Some(user)) => Ok(Json(MeResponse { user })),
        Ok(None) => Err(AppError::not_found("Usuario no encontrado")),
        Err(err) => {
            tracing::error!(error = %err, user_id = auth_user.id, "profile load failed");
            Err(AppError::internal("Error al cargar perfil"))
        }
    }
}
