use std::path::PathBuf;

/// Ledger sink configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Remote ledger endpoint. When unset the local hash chain is used.
    pub url: Option<String>,
    /// Optional JSONL journal for the local hash chain.
    pub journal_path: Option<PathBuf>,
    /// How long an ingest waits for a ledger receipt, in milliseconds.
    pub timeout_ms: u64,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Serialized classifier model, loaded at startup and replaced on retrain.
    pub model_path: PathBuf,
    /// Secret expected in `X-API-KEY` for admin downloads. Unset disables them.
    pub admin_api_key: Option<String>,
    pub ledger: LedgerConfig,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `5000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `MODEL_PATH`           | `fault_model.json`         |
    /// | `ADMIN_API_KEY`        | unset                      |
    /// | `LEDGER_URL`           | unset                      |
    /// | `LEDGER_PATH`          | unset                      |
    /// | `LEDGER_TIMEOUT_MS`    | `2000`                     |
    /// | `LOG_FORMAT`           | `text`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let model_path = std::env::var("MODEL_PATH")
            .unwrap_or_else(|_| "fault_model.json".into())
            .into();

        let admin_api_key = non_empty_var("ADMIN_API_KEY");

        let timeout_ms: u64 = std::env::var("LEDGER_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".into())
            .parse()
            .expect("LEDGER_TIMEOUT_MS must be a valid u64");

        let ledger = LedgerConfig {
            url: non_empty_var("LEDGER_URL"),
            journal_path: non_empty_var("LEDGER_PATH").map(PathBuf::from),
            timeout_ms,
        };

        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            model_path,
            admin_api_key,
            ledger,
            log_format,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
