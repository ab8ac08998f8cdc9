use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEV_JWT_SECRET: &str = "divide-dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log: LogConfig,
    pub jwt: JwtConfig,
    pub db: DbConfig,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    /// Daily-rolled `divide.log` is written here when set.
    pub file_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in: String,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub busy_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        Self {
            host,
            port,
            log: LogConfig::from_env(),
            jwt: JwtConfig::from_env(),
            db: DbConfig::from_env(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl LogConfig {
    fn from_env() -> Self {
        let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let file_dir = if env_bool("ENABLE_FILE_LOGS") {
            let dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
            Some(PathBuf::from(dir))
        } else {
            None
        };

        Self { level, file_dir }
    }
}

impl JwtConfig {
    fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let expires_in = std::env::var("JWT_EXPIRES_IN")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "7d".to_string());

        Self { secret, expires_in }
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.secret == DEV_JWT_SECRET
    }
}

impl DbConfig {
    fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "sqlite:./data/dividivertido.db?mode=rwc".to_string());

        Self {
            url,
            max_connections: env_u64("DB_MAX_CONNECTIONS", 10) as u32,
            acquire_timeout: Duration::from_millis(env_u64("DB_ACQUIRE_TIMEOUT_MS", 5000)),
            busy_timeout: Duration::from_millis(env_u64("SQLITE_BUSY_TIMEOUT_MS", 5000)),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn env_bool(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_u64_falls_back_on_garbage() {
        std::env::set_var("DIVIDE_TEST_U64", "not-a-number");
        assert_eq!(env_u64("DIVIDE_TEST_U64", 7), 7);
        std::env::set_var("DIVIDE_TEST_U64", "0");
        assert_eq!(env_u64("DIVIDE_TEST_U64", 7), 7);
        std::env::set_var("DIVIDE_TEST_U64", " 42 ");
        assert_eq!(env_u64("DIVIDE_TEST_U64", 7), 42);
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let mut config = Config::from_env();
        config.host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.port = 4123;
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:4123");
    }
}
