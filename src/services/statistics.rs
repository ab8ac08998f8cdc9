//! Per-user progress statistics.
//!
//! Every answer is appended to `progress_events`; the summary row in
//! `statistics_summary` is then rebuilt from the whole log rather than
//! patched, so it can always be thrown away and recomputed.

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::core::UserLocks;
use crate::db::operations::progress;
use crate::db::DatabaseProxy;
use crate::response::serialize_js_number;
use crate::services::coerce::{as_integer, is_present, is_truthy};

/// Cumulative correct answers needed for each level above 1, highest first.
const LEVEL_THRESHOLDS: [(i64, i64); 4] = [(25, 5), (15, 4), (10, 3), (5, 2)];

/// Correct answers that count as 100% overall progress.
const FULL_PROGRESS_CORRECT: f64 = 50.0;

pub const FIRST_LEVEL: i64 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTally {
    pub total: i64,
    pub correct: i64,
    pub incorrect: i64,
}

/// One answered problem as submitted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressInput {
    pub level: i64,
    pub problem_index: i64,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub user_id: i64,
    #[serde(serialize_with = "serialize_js_number")]
    pub overall_progress: f64,
    #[serde(serialize_with = "serialize_js_number")]
    pub current_level_progress: f64,
    pub current_level: i64,
    pub problems_completed: i64,
    pub correct_count: i64,
    pub incorrect_count: i64,
    pub last_updated: NaiveDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum StatisticsError {
    #[error("validation error: {0}")]
    Validation(&'static str),
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl ProgressInput {
    /// Builds an input from raw JSON fields. `level` and `problem_index` must
    /// be present integers (no range check); `correct` follows JavaScript
    /// truthiness, so a missing flag means a wrong answer.
    pub fn from_json(
        level: Option<&serde_json::Value>,
        problem_index: Option<&serde_json::Value>,
        correct: Option<&serde_json::Value>,
    ) -> Result<Self, StatisticsError> {
        let (Some(level), Some(problem_index)) = (level, problem_index) else {
            return Err(StatisticsError::Validation("Datos incompletos"));
        };
        if !is_present(level) || !is_present(problem_index) {
            return Err(StatisticsError::Validation("Datos incompletos"));
        }

        let level = as_integer(level).ok_or(StatisticsError::Validation("Datos inválidos"))?;
        let problem_index =
            as_integer(problem_index).ok_or(StatisticsError::Validation("Datos inválidos"))?;

        Ok(Self {
            level,
            problem_index,
            correct: correct.map(is_truthy).unwrap_or(false),
        })
    }
}

pub fn derive_level(correct: i64) -> i64 {
    LEVEL_THRESHOLDS
        .iter()
        .find(|(threshold, _)| correct >= *threshold)
        .map(|(_, level)| *level)
        .unwrap_or(FIRST_LEVEL)
}

pub fn overall_progress(correct: i64) -> f64 {
    ((correct as f64 / FULL_PROGRESS_CORRECT) * 100.0).min(100.0)
}

/// Share of correct answers among those logged at one level. Not clamped:
/// a ratio of counts over the same rows cannot exceed 100.
pub fn level_progress(level_tally: EventTally) -> f64 {
    if level_tally.total == 0 {
        0.0
    } else {
        (level_tally.correct as f64 / level_tally.total as f64) * 100.0
    }
}

/// `level_tally` must be the tally of events at `derive_level(tally.correct)`.
pub fn summarize(
    user_id: i64,
    tally: EventTally,
    level_tally: EventTally,
    now: NaiveDateTime,
) -> StatisticsSummary {
    StatisticsSummary {
        user_id,
        overall_progress: overall_progress(tally.correct),
        current_level_progress: level_progress(level_tally),
        current_level: derive_level(tally.correct),
        problems_completed: tally.total,
        correct_count: tally.correct,
        incorrect_count: tally.incorrect,
        last_updated: now,
    }
}

impl StatisticsSummary {
    pub fn empty(user_id: i64, now: NaiveDateTime) -> Self {
        summarize(user_id, EventTally::default(), EventTally::default(), now)
    }
}

/// Appends one answer and rebuilds the caller's summary.
///
/// Runs under the per-user lock and inside a single transaction, so two
/// concurrent submissions by the same user both land in the summary.
pub async fn record_progress(
    proxy: &DatabaseProxy,
    locks: &UserLocks,
    user_id: i64,
    input: ProgressInput,
) -> Result<StatisticsSummary, StatisticsError> {
    let _guard = locks.lock(user_id).await;
    let now = Utc::now().naive_utc();

    let mut tx = proxy.pool().begin().await?;
    // Write first: SQLite takes the write lock here instead of upgrading
    // from a read lock halfway through.
    progress::insert_event(&mut *tx, user_id, &input, now).await?;
    let summary = recompute(&mut *tx, user_id, now).await?;
    tx.commit().await?;

    tracing::debug!(
        user_id,
        level = input.level,
        problem_index = input.problem_index,
        correct = input.correct,
        current_level = summary.current_level,
        problems_completed = summary.problems_completed,
        "progress recorded"
    );

    Ok(summary)
}

/// Recomputes the summary from the event log without logging anything new.
pub async fn rebuild_summary(
    proxy: &DatabaseProxy,
    locks: &UserLocks,
    user_id: i64,
) -> Result<StatisticsSummary, StatisticsError> {
    let _guard = locks.lock(user_id).await;
    let now = Utc::now().naive_utc();

    let mut tx = proxy.pool().begin().await?;
    let summary = recompute(&mut *tx, user_id, now).await?;
    tx.commit().await?;

    Ok(summary)
}

async fn recompute(
    conn: &mut SqliteConnection,
    user_id: i64,
    now: NaiveDateTime,
) -> Result<StatisticsSummary, sqlx::Error> {
    let tally = progress::tally_events(&mut *conn, user_id).await?;
    let level = derive_level(tally.correct);
    let level_tally = progress::tally_level_events(&mut *conn, user_id, level).await?;

    let summary = summarize(user_id, tally, level_tally, now);
    progress::upsert_summary(&mut *conn, &summary).await?;
    Ok(summary)
}
