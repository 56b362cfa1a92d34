// src/config.rs

use std::env;
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub listen_addr: String,
    pub log_dir: String,
    pub max_connections: u32,
    /// Cap on concurrent subtree fetch workers; `None` means one per node.
    pub fetch_workers: Option<usize>,
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data.sqlite3".to_string(),
            rust_log: "info".to_string(),
            listen_addr: "0.0.0.0:3000".to_string(),
            log_dir: "logs".to_string(),
            max_connections: 5,
            fetch_workers: None,
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let rust_log = env::var("RUST_LOG").unwrap_or(defaults.rust_log);

        let listen_addr = env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr);

        let log_dir = env::var("LOG_DIR").unwrap_or(defaults.log_dir);

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_connections);

        let fetch_workers = env::var("FETCH_WORKERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0);

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| parse_list(&v))
            .unwrap_or_default();

        Self {
            database_url,
            rust_log,
            listen_addr,
            log_dir,
            max_connections,
            fetch_workers,
            cors_origins,
        }
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
