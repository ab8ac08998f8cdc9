use chrono::Utc;
use serde::Serialize;

use crate::auth::{sign_token, AuthError};
use crate::config::JwtConfig;
use crate::db::operations::{progress, user};
use crate::db::DatabaseProxy;
use crate::services::coerce::{as_integer, is_truthy};
use crate::services::user_profile::{self, UserProfile};

const BCRYPT_COST: u32 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub age: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("validation error: {0}")]
    Validation(&'static str),
    #[error("username already taken")]
    UsernameTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("profile missing after write for user {0}")]
    ProfileMissing(i64),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Token(#[from] AuthError),
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl RegisterInput {
    pub fn from_json(
        username: Option<&serde_json::Value>,
        password: Option<&serde_json::Value>,
        age: Option<&serde_json::Value>,
    ) -> Result<Self, AccountError> {
        let (Some(username), Some(password), Some(age)) = (
            required_text(username),
            required_text(password),
            age.filter(|v| is_truthy(v)),
        ) else {
            return Err(AccountError::Validation("Faltan campos"));
        };

        let age = as_integer(age).ok_or(AccountError::Validation("Edad inválida"))?;

        Ok(Self {
            username,
            password,
            age,
        })
    }
}

impl LoginInput {
    pub fn from_json(
        username: Option<&serde_json::Value>,
        password: Option<&serde_json::Value>,
    ) -> Result<Self, AccountError> {
        let (Some(username), Some(password)) = (required_text(username), required_text(password))
        else {
            return Err(AccountError::Validation("Faltan campos"));
        };

        Ok(Self { username, password })
    }
}

fn required_text(value: Option<&serde_json::Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Creates the account and its zeroed statistics row in one transaction.
pub async fn register(
    proxy: &DatabaseProxy,
    jwt: &JwtConfig,
    input: RegisterInput,
) -> Result<AuthSession, AccountError> {
    if user::find_user_id_by_username(proxy, &input.username)
        .await?
        .is_some()
    {
        return Err(AccountError::UsernameTaken);
    }

    let password_hash = hash_password(input.password).await?;
    let now = Utc::now().naive_utc();

    let mut tx = proxy.pool().begin().await?;
    let user_id = match user::insert_user(&mut *tx, &input.username, &password_hash, input.age, now)
        .await
    {
        Ok(id) => id,
        // Lost a race with another registration of the same name.
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Err(AccountError::UsernameTaken);
        }
        Err(err) => return Err(err.into()),
    };
    progress::insert_empty_summary(&mut *tx, user_id, now).await?;
    tx.commit().await?;

    tracing::info!(user_id, username = %input.username, "account registered");

    issue_session(proxy, jwt, user_id).await
}

/// Unknown usernames and wrong passwords fail the same way.
pub async fn login(
    proxy: &DatabaseProxy,
    jwt: &JwtConfig,
    input: LoginInput,
) -> Result<AuthSession, AccountError> {
    let Some(credentials) = user::find_credentials(proxy, &input.username).await? else {
        return Err(AccountError::InvalidCredentials);
    };

    if !verify_password(input.password, credentials.password_hash).await? {
        return Err(AccountError::InvalidCredentials);
    }

    user::touch_last_login(proxy, credentials.id, Utc::now().naive_utc()).await?;

    issue_session(proxy, jwt, credentials.id).await
}

async fn issue_session(
    proxy: &DatabaseProxy,
    jwt: &JwtConfig,
    user_id: i64,
) -> Result<AuthSession, AccountError> {
    let user = user_profile::get_profile(proxy, user_id)
        .await?
        .ok_or(AccountError::ProfileMissing(user_id))?;
    let token = sign_token(jwt, user_id)?;
    Ok(AuthSession { token, user })
}

async fn hash_password(password: String) -> Result<String, AccountError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|err| AccountError::Hash(err.to_string()))?
        .map_err(|err| AccountError::Hash(err.to_string()))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AccountError> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| AccountError::Hash(err.to_string()))?;
    // A malformed stored hash is a failed login, not a server error.
    Ok(verified.unwrap_or(false))
}
