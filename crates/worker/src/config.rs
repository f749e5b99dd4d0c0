use std::time::Duration;

use loyalty_cache::CacheConnectOptions;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Postgres connection URL (required).
    pub database_url: String,
    /// Redis connection URL. Unset selects the in-process cache.
    pub redis_url: Option<String>,
    /// Per-call cache I/O timeout in milliseconds (default: `250`).
    pub cache_io_timeout_ms: u64,
    /// Budget for one invalidation pattern sweep in milliseconds (default: `5000`).
    pub cache_sweep_timeout_ms: u64,
    /// Keys requested per Redis `SCAN` round trip (default: `500`).
    pub redis_scan_count: usize,
    /// Ledger read timeout per customer in seconds (default: `30`).
    pub ledger_timeout_secs: u64,
    /// Run the downgrade pass once at startup before waiting for the
    /// first scheduled fire time (default: `false`).
    pub run_on_start: bool,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                  | Default                  |
    /// |--------------------------|--------------------------|
    /// | `DATABASE_URL`           | required                 |
    /// | `REDIS_URL`              | unset (in-process cache) |
    /// | `CACHE_IO_TIMEOUT_MS`    | `250`                    |
    /// | `CACHE_SWEEP_TIMEOUT_MS` | `5000`                   |
    /// | `REDIS_SCAN_COUNT`       | `500`                    |
    /// | `LEDGER_TIMEOUT_SECS`    | `30`                     |
    /// | `DOWNGRADE_RUN_ON_START` | `false`                  |
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let redis_url = std::env::var("REDIS_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let run_on_start = std::env::var("DOWNGRADE_RUN_ON_START")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Self {
            database_url,
            redis_url,
            cache_io_timeout_ms: env_u64("CACHE_IO_TIMEOUT_MS", 250),
            cache_sweep_timeout_ms: env_u64("CACHE_SWEEP_TIMEOUT_MS", 5000),
            redis_scan_count: env_u64("REDIS_SCAN_COUNT", 500) as usize,
            ledger_timeout_secs: env_u64("LEDGER_TIMEOUT_SECS", 30),
            run_on_start,
        }
    }

    pub fn cache_io_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_io_timeout_ms)
    }

    pub fn cache_sweep_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_sweep_timeout_ms)
    }

    /// Options for reaching the cache store.
    pub fn cache_connect_options(&self) -> CacheConnectOptions {
        CacheConnectOptions {
            redis_url: self.redis_url.clone(),
            scan_count: self.redis_scan_count,
            round_trip_timeout: self.cache_io_timeout(),
        }
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger_timeout_secs)
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid u64")),
        Err(_) => default,
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
