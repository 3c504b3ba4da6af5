use std::path::PathBuf;
use std::time::Duration;

use patchwright_core::analysis::DuplicatePolicy;
use patchwright_core::validation::DEFAULT_FUZZ_TOLERANCE;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on draining in-flight requests at shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Registry root. Must exist at startup.
    pub patches_dir: PathBuf,
    /// Root of the `<owner>/<repo>` snapshots read by the content resolver.
    pub repo_snapshot_dir: PathBuf,
    /// Per-call bound on content resolution, in milliseconds (default: `5000`).
    pub resolver_timeout_ms: u64,
    /// Validator search window in lines (default: `5`).
    pub fuzz_tolerance: usize,
    /// How repeated proposals for one path are reconciled (default: last wins).
    pub duplicate_policy: DuplicatePolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                                       |
    /// |-------------------------|-----------------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                                     |
    /// | `PORT`                  | `8000`                                        |
    /// | `CORS_ORIGINS`          | `http://localhost:3000,http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                                          |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                                          |
    /// | `PATCHES_DIR`           | `./patches`                                   |
    /// | `REPO_SNAPSHOT_DIR`     | `./repos`                                     |
    /// | `RESOLVER_TIMEOUT_MS`   | `5000`                                        |
    /// | `FUZZ_TOLERANCE`        | `5`                                           |
    /// | `DUPLICATE_PROPOSALS`   | `last` (or `first`)                           |
    ///
    /// Panics on unparsable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let patches_dir = PathBuf::from(
            std::env::var("PATCHES_DIR").unwrap_or_else(|_| "./patches".into()),
        );

        let repo_snapshot_dir = PathBuf::from(
            std::env::var("REPO_SNAPSHOT_DIR").unwrap_or_else(|_| "./repos".into()),
        );

        let resolver_timeout_ms: u64 = std::env::var("RESOLVER_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("RESOLVER_TIMEOUT_MS must be a valid u64");

        let fuzz_tolerance: usize = std::env::var("FUZZ_TOLERANCE")
            .unwrap_or_else(|_| DEFAULT_FUZZ_TOLERANCE.to_string())
            .parse()
            .expect("FUZZ_TOLERANCE must be a non-negative integer");

        let duplicate_policy = match std::env::var("DUPLICATE_PROPOSALS") {
            Ok(name) => DuplicatePolicy::from_name(&name)
                .unwrap_or_else(|| panic!("DUPLICATE_PROPOSALS must be 'last' or 'first', got '{name}'")),
            Err(_) => DuplicatePolicy::default(),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            patches_dir,
            repo_snapshot_dir,
            resolver_timeout_ms,
            fuzz_tolerance,
            duplicate_policy,
        }
    }

    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver_timeout_ms)
    }
}
