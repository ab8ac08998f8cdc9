use axum::extract::State;
use axum::{Extension, Json};
use bytes::Bytes;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::response::{serialize_js_number, AppError};
use crate::routes::parse_body;
use crate::services::statistics::{self, ProgressInput, StatisticsError, StatisticsSummary};
use crate::services::video::{self, VideoError, VideoViewInput};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProgressResponse {
    success: bool,
    stats: ProgressStats,
}

#[derive(Debug, Serialize)]
pub struct ProgressStats {
    #[serde(serialize_with = "serialize_js_number")]
    progreso_general: f64,
    #[serde(serialize_with = "serialize_js_number")]
    progreso_nivel_actual: f64,
    nivel_actual: i64,
    problemas_completados: i64,
    aciertos: i64,
    fallos: i64,
}

impl From<StatisticsSummary> for ProgressStats {
    fn from(summary: StatisticsSummary) -> Self {
        Self {
            progreso_general: summary.overall_progress,
            progreso_nivel_actual: summary.current_level_progress,
            nivel_actual: summary.current_level,
            problemas_completados: summary.problems_completed,
            aciertos: summary.correct_count,
            fallos: summary.incorrect_count,
        }
    }
}

#[derive(Serialize)]
pub struct SuccessResponse {
    success: bool,
}

pub async fn record(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<ProgressResponse>, AppError> {
    let fields = parse_body(&body)?;
    let input = ProgressInput::from_json(
        fields.get("nivel"),
        fields.get("problemaIndex"),
        fields.get("correcto"),
    )
    .map_err(|err| statistics_error(err, auth_user.id))?;

    let summary = statistics::record_progress(
        state.db_proxy(),
        state.user_locks(),
        auth_user.id,
        input,
    )
    .await
    .map_err(|err| statistics_error(err, auth_user.id))?;

    Ok(Json(ProgressResponse {
        success: true,
        stats: summary.into(),
    }))
}

pub async fn video_view(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, AppError> {
    let fields = parse_body(&body)?;
    let input = VideoViewInput::from_json(fields.get("nivelVideo"), fields.get("tituloVideo"))
        .map_err(|err| video_error(err, auth_user.id))?;

    video::record_video_view(state.db_proxy(), auth_user.id, &input)
        .await
        .map_err(|err| video_error(err, auth_user.id))?;

    Ok(Json(SuccessResponse { success: true }))
}

fn statistics_error(err: StatisticsError, user_id: i64) -> AppError {
    match err {
        StatisticsError::Validation(message) => AppError::validation(message),
        StatisticsError::Sql(err) => {
            tracing::error!(error = %err, user_id, "progress save failed");
            AppError::internal("Error al guardar progreso")
        }
    }
}

fn video_error(err: VideoError, user_id: i64) -> AppError {
    match err {
        VideoError::Validation(message) => AppError::validation(message),
        VideoError::Sql(err) => {
            tracing::error!(error = %err, user_id, "video view save failed");
            AppError::internal("Error al registrar video visto")
        }
    }
}
