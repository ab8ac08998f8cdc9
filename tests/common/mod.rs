#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use divide_backend::config::{Config, DbConfig, JwtConfig, LogConfig};
use divide_backend::db::{migrate, DatabaseProxy};
use divide_backend::state::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

/// A migrated database in a private temp directory plus the router over it.
/// The directory is deleted when this is dropped.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _dir: TempDir,
}

pub fn test_config(db_url: String) -> Config {
    Config {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        log: LogConfig {
            level: "warn".to_string(),
            file_dir: None,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            expires_in: "7d".to_string(),
        },
        db: DbConfig {
            url: db_url,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
        },
    }
}

pub async fn create_test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("test.db").display());
    let config = test_config(url);

    let proxy = DatabaseProxy::connect(&config.db).await.unwrap();
    migrate::run_migrations(proxy.pool()).await.unwrap();

    let state = AppState::new(config, proxy);
    let router = divide_backend::build_app(state.clone());

    TestApp {
        router,
        state,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Registers `username` and returns its token and user id.
    pub async fn register(&self, username: &str) -> (String, i64) {
        let (status, body) = self
            .post(
                "/api/register",
                None,
                json!({"username": username, "password": "secreto", "age": 9}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let token = body["token"].as_str().unwrap().to_string();
        let id = body["user"]["id"].as_i64().unwrap();
        (token, id)
    }

    pub async fn answer(&self, token: &str, nivel: i64, correcto: bool) -> Value {
        let (status, body) = self
            .post(
                "/api/progress",
                Some(token),
                json!({"nivel": nivel, "problemaIndex": 0, "correcto": correcto}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }
}
