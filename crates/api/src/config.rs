use std::time::Duration;

use loyalty_cache::CacheConnectOptions;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Redis connection URL. Unset selects the in-process cache.
    pub redis_url: Option<String>,
    /// TTL of cached GET responses in seconds (default: `60`).
    pub cache_ttl_secs: u64,
    /// Per-call cache I/O timeout in milliseconds (default: `250`).
    pub cache_io_timeout_ms: u64,
    /// Budget for one invalidation pattern sweep in milliseconds (default: `5000`).
    pub cache_sweep_timeout_ms: u64,
    /// Keys requested per Redis `SCAN` round trip (default: `500`).
    pub redis_scan_count: usize,
    /// Ledger read timeout for eligibility previews in seconds (default: `30`).
    pub ledger_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                  |
    /// |--------------------------|--------------------------|
    /// | `HOST`                   | `0.0.0.0`                |
    /// | `PORT`                   | `3000`                   |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                     |
    /// | `REDIS_URL`              | unset (in-process cache) |
    /// | `CACHE_TTL_SECS`         | `60`                     |
    /// | `CACHE_IO_TIMEOUT_MS`    | `250`                    |
    /// | `CACHE_SWEEP_TIMEOUT_MS` | `5000`                   |
    /// | `REDIS_SCAN_COUNT`       | `500`                    |
    /// | `LEDGER_TIMEOUT_SECS`    | `30`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env_u64("REQUEST_TIMEOUT_SECS", 30);

        let redis_url = std::env::var("REDIS_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            redis_url,
            cache_ttl_secs: env_u64("CACHE_TTL_SECS", 60),
            cache_io_timeout_ms: env_u64("CACHE_IO_TIMEOUT_MS", 250),
            cache_sweep_timeout_ms: env_u64("CACHE_SWEEP_TIMEOUT_MS", 5000),
            redis_scan_count: env_u64("REDIS_SCAN_COUNT", 500) as usize,
            ledger_timeout_secs: env_u64("LEDGER_TIMEOUT_SECS", 30),
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
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid u64")),
        Err(_) => default,
    }
}
