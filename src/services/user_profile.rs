use serde::Serialize;
use sqlx::Row;

use crate::db::DatabaseProxy;
use crate::response::serialize_js_number;
use crate::services::statistics::FIRST_LEVEL;

/// Account identity joined with its statistics, in the shape the web client
/// reads (`/me`, `/login`, `/register`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub edad: i64,
    #[serde(serialize_with = "serialize_js_number")]
    pub progreso_general: f64,
    #[serde(serialize_with = "serialize_js_number")]
    pub progreso_nivel_actual: f64,
    pub nivel_actual: i64,
    pub problemas_completados: i64,
    pub aciertos: i64,
    pub fallos: i64,
}

/// Missing summary rows read as zeroes at level 1, so a user who has never
/// answered anything still gets a profile.
pub async fn get_profile(
    proxy: &DatabaseProxy,
    user_id: i64,
) -> Result<Option<UserProfile>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT
          u."id",
          u."username",
          u."age",
          COALESCE(s."overall_progress", 0.0) AS "overall_progress",
          COALESCE(s."current_level_progress", 0.0) AS "current_level_progress",
          COALESCE(s."current_level", ?) AS "current_level",
          COALESCE(s."problems_completed", 0) AS "problems_completed",
          COALESCE(s."correct_count", 0) AS "correct_count",
          COALESCE(s."incorrect_count", 0) AS "incorrect_count"
        FROM "users" u
        LEFT JOIN "statistics_summary" s ON s."user_id" = u."id"
        WHERE u."id" = ?
        "#,
    )
    .bind(FIRST_LEVEL)
    .bind(user_id)
    .fetch_optional(proxy.pool())
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(UserProfile {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        edad: row.try_get("age")?,
        progreso_general: row.try_get("overall_progress")?,
        progreso_nivel_actual: row.try_get("current_level_progress")?,
        nivel_actual: row.try_get("current_level")?,
        problemas_completados: row.try_get("problems_completed")?,
        aciertos: row.try_get("correct_count")?,
        fallos: row.try_get("incorrect_count")?,
    }))
}
