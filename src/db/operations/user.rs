use chrono::NaiveDateTime;
use sqlx::{Row, SqliteConnection};

use crate::auth::AuthUser;
use crate::db::DatabaseProxy;

#[derive(Debug, Clone)]
pub struct CredentialRow {
    pub id: i64,
    pub password_hash: String,
}

pub async fn find_user_id_by_username(
    proxy: &DatabaseProxy,
    username: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT "id" FROM "users" WHERE "username" = ? LIMIT 1"#)
        .bind(username)
        .fetch_optional(proxy.pool())
        .await
}

pub async fn find_credentials(
    proxy: &DatabaseProxy,
    username: &str,
) -> Result<Option<CredentialRow>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT "id", "password_hash" FROM "users" WHERE "username" = ? LIMIT 1"#,
    )
    .bind(username)
    .fetch_optional(proxy.pool())
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(CredentialRow {
        id: row.try_get("id")?,
        password_hash: row.try_get("password_hash")?,
    }))
}

pub async fn find_auth_user(
    proxy: &DatabaseProxy,
    user_id: i64,
) -> Result<Option<AuthUser>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT "id", "username" FROM "users" WHERE "id" = ? LIMIT 1"#)
        .bind(user_id)
        .fetch_optional(proxy.pool())
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(AuthUser {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
    }))
}

pub async fn insert_user(
    conn: &mut SqliteConnection,
    username: &str,
    password_hash: &str,
    age: i64,
    created_at: NaiveDateTime,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO "users" ("username", "password_hash", "age", "created_at")
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(age)
    .bind(created_at)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn touch_last_login(
    proxy: &DatabaseProxy,
    user_id: i64,
    at: NaiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(r#"UPDATE "users" SET "last_login" = ? WHERE "id" = ?"#)
        .bind(at)
        .bind(user_id)
        .execute(proxy.pool())
        .await?;
    Ok(())
}

pub async fn last_login(
    proxy: &DatabaseProxy,
    user_id: i64,
) -> Result<Option<NaiveDateTime>, sqlx::Error> {
    let value: Option<Option<NaiveDateTime>> =
        sqlx::query_scalar(r#"SELECT "last_login" FROM "users" WHERE "id" = ?"#)
            .bind(user_id)
            .fetch_optional(proxy.pool())
            .await?;
    Ok(value.flatten())
}
