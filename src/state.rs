use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::Config;
use crate::core::UserLocks;
use crate::db::DatabaseProxy;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    config: Arc<Config>,
    db_proxy: DatabaseProxy,
    user_locks: Arc<UserLocks>,
}

impl AppState {
    pub fn new(config: Config, db_proxy: DatabaseProxy) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            config: Arc::new(config),
            db_proxy,
            user_locks: Arc::new(UserLocks::new()),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db_proxy(&self) -> &DatabaseProxy {
        &self.db_proxy
    }

    pub fn user_locks(&self) -> &UserLocks {
        &self.user_locks
    }
}
