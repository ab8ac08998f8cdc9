use chrono::{NaiveDateTime, Utc};

use crate::db::DatabaseProxy;
use crate::services::coerce::{as_integer, as_text, is_truthy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoViewInput {
    pub level: i64,
    pub title: String,
}

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("validation error: {0}")]
    Validation(&'static str),
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl VideoViewInput {
    /// Both fields must be truthy: level `0` or an empty title is rejected.
    pub fn from_json(
        level: Option<&serde_json::Value>,
        title: Option<&serde_json::Value>,
    ) -> Result<Self, VideoError> {
        let (Some(level), Some(title)) = (level, title) else {
            return Err(VideoError::Validation("Datos incompletos"));
        };
        if !is_truthy(level) || !is_truthy(title) {
            return Err(VideoError::Validation("Datos incompletos"));
        }

        let level = as_integer(level).ok_or(VideoError::Validation("Datos inválidos"))?;
        let title = as_text(title).ok_or(VideoError::Validation("Datos inválidos"))?;

        Ok(Self { level, title })
    }
}

/// Records that `user_id` watched a video; repeat views only move
/// `viewed_at` forward.
pub async fn record_video_view(
    proxy: &DatabaseProxy,
    user_id: i64,
    input: &VideoViewInput,
) -> Result<(), VideoError> {
    let now = Utc::now().naive_utc();

    sqlx::query(
        r#"
        INSERT INTO "video_views" ("user_id", "level", "title", "viewed_at")
        VALUES (?, ?, ?, ?)
        ON CONFLICT ("user_id", "level", "title") DO UPDATE SET
            "viewed_at" = excluded."viewed_at"
        "#,
    )
    .bind(user_id)
    .bind(input.level)
    .bind(&input.title)
    .bind(now)
    .execute(proxy.pool())
    .await?;

    Ok(())
}

pub async fn last_viewed_at(
    proxy: &DatabaseProxy,
    user_id: i64,
    level: i64,
    title: &str,
) -> Result<Option<NaiveDateTime>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT "viewed_at" FROM "video_views"
        WHERE "user_id" = ? AND "level" = ? AND "title" = ?
        "#,
    )
    .bind(user_id)
    .bind(level)
    .bind(title)
    .fetch_optional(proxy.pool())
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_fields_are_incomplete() {
        let title = json!("Dividir entre 2");
        for level in [json!(0), json!(null), json!(""), json!(false)] {
            assert!(matches!(
                VideoViewInput::from_json(Some(&level), Some(&title)),
                Err(VideoError::Validation("Datos incompletos"))
            ));
        }

        let level = json!(2);
        assert!(VideoViewInput::from_json(Some(&level), Some(&json!(""))).is_err());
        assert!(VideoViewInput::from_json(Some(&level), None).is_err());
    }

    #[test]
    fn string_level_is_accepted() {
        let input =
            VideoViewInput::from_json(Some(&json!("3")), Some(&json!("Repaso"))).unwrap();
        assert_eq!(
            input,
            VideoViewInput {
                level: 3,
                title: "Repaso".to_string()
            }
        );
    }
}
