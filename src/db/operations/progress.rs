use chrono::NaiveDateTime;
use sqlx::{Row, SqliteConnection};

use crate::db::DatabaseProxy;
use crate::services::statistics::{EventTally, ProgressInput, StatisticsSummary};

pub async fn insert_event(
    conn: &mut SqliteConnection,
    user_id: i64,
    input: &ProgressInput,
    occurred_at: NaiveDateTime,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO "progress_events" ("user_id", "level", "problem_index", "correct", "occurred_at")
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(input.level)
    .bind(input.problem_index)
    .bind(input.correct)
    .bind(occurred_at)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn tally_events(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<EventTally, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT
          COUNT(*) AS "total",
          COALESCE(SUM(CASE WHEN "correct" = 1 THEN 1 ELSE 0 END), 0) AS "correct",
          COALESCE(SUM(CASE WHEN "correct" = 0 THEN 1 ELSE 0 END), 0) AS "incorrect"
        FROM "progress_events"
        WHERE "user_id" = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;

    tally_from_row(&row)
}

pub async fn tally_level_events(
    conn: &mut SqliteConnection,
    user_id: i64,
    level: i64,
) -> Result<EventTally, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT
          COUNT(*) AS "total",
          COALESCE(SUM(CASE WHEN "correct" = 1 THEN 1 ELSE 0 END), 0) AS "correct",
          COALESCE(SUM(CASE WHEN "correct" = 0 THEN 1 ELSE 0 END), 0) AS "incorrect"
        FROM "progress_events"
        WHERE "user_id" = ? AND "level" = ?
        "#,
    )
    .bind(user_id)
    .bind(level)
    .fetch_one(conn)
    .await?;

    tally_from_row(&row)
}

fn tally_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<EventTally, sqlx::Error> {
    Ok(EventTally {
        total: row.try_get("total")?,
        correct: row.try_get("correct")?,
        incorrect: row.try_get("incorrect")?,
    })
}

/// Zeroed summary written alongside a new account.
pub async fn insert_empty_summary(
    conn: &mut SqliteConnection,
    user_id: i64,
    now: NaiveDateTime,
) -> Result<(), sqlx::Error> {
    upsert_summary(conn, &StatisticsSummary::empty(user_id, now)).await
}

pub async fn upsert_summary(
    conn: &mut SqliteConnection,
    summary: &StatisticsSummary,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "statistics_summary" (
            "user_id", "overall_progress", "current_level_progress", "current_level",
            "problems_completed", "correct_count", "incorrect_count", "last_updated"
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT ("user_id") DO UPDATE SET
            "overall_progress" = excluded."overall_progress",
            "current_level_progress" = excluded."current_level_progress",
            "current_level" = excluded."current_level",
            "problems_completed" = excluded."problems_completed",
            "correct_count" = excluded."correct_count",
            "incorrect_count" = excluded."incorrect_count",
            "last_updated" = excluded."last_updated"
        "#,
    )
    .bind(summary.user_id)
    .bind(summary.overall_progress)
    .bind(summary.current_level_progress)
    .bind(summary.current_level)
    .bind(summary.problems_completed)
    .bind(summary.correct_count)
    .bind(summary.incorrect_count)
    .bind(summary.last_updated)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn fetch_summary(
    proxy: &DatabaseProxy,
    user_id: i64,
) -> Result<Option<StatisticsSummary>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT
          "user_id", "overall_progress", "current_level_progress", "current_level",
          "problems_completed", "correct_count", "incorrect_count", "last_updated"
        FROM "statistics_summary"
        WHERE "user_id" = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(proxy.pool())
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(StatisticsSummary {
        user_id: row.try_get("user_id")?,
        overall_progress: row.try_get("overall_progress")?,
        current_level_progress: row.try_get("current_level_progress")?,
        current_level: row.try_get("current_level")?,
        problems_completed: row.try_get("problems_completed")?,
        correct_count: row.try_get("correct_count")?,
        incorrect_count: row.try_get("incorrect_count")?,
        last_updated: row.try_get("last_updated")?,
    }))
}

pub async fn count_events(proxy: &DatabaseProxy, user_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM "progress_events" WHERE "user_id" = ?"#)
        .bind(user_id)
        .fetch_one(proxy.pool())
        .await
}
