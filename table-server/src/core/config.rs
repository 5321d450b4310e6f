use std::path::PathBuf;

use crate::auth::JwtConfig;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | /var/lib/tabletap | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | BUS_TCP_PORT | 8081 | Broadcast-hub TCP port |
/// | CATALOG_PATH | {WORK_DIR}/catalog.json | Menu/table/station catalog file |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | REQUEST_TIMEOUT_MS | 30000 | HTTP request timeout |
/// | PLACE_TIMEOUT_MS | 5000 | Bound on order placement |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/tabletap HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database, catalog and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Broadcast-hub TCP port (kitchen displays and waiter terminals connect
    /// here)
    pub bus_tcp_port: u16,
    /// Path to the catalog JSON file
    pub catalog_path: String,
    /// JWT validation config for staff tokens
    pub jwt: JwtConfig,
    /// development | staging | production
    pub environment: String,
    /// HTTP request timeout (milliseconds)
    pub request_timeout_ms: u64,
    /// Upper bound on one order placement (milliseconds)
    pub place_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/tabletap".into());
        let catalog_path = std::env::var("CATALOG_PATH")
            .unwrap_or_else(|_| format!("{}/catalog.json", work_dir.trim_end_matches('/')));
        Self {
            work_dir,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            bus_tcp_port: std::env::var("BUS_TCP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8081),
            catalog_path,
            jwt: JwtConfig::from_env(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30_000),
            place_timeout_ms: std::env::var("PLACE_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5_000),
        }
    }

    /// Override work dir and ports, for tests
    pub fn with_overrides(
        work_dir: impl Into<String>,
        http_port: u16,
        bus_tcp_port: u16,
    ) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.catalog_path = format!("{}/catalog.json", config.work_dir.trim_end_matches('/'));
        config.http_port = http_port;
        config.bus_tcp_port = bus_tcp_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Directory holding the redb database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("data")
    }

    /// Directory holding rolled log files
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create the work directory structure if missing
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
