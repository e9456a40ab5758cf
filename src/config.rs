use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Database connection URL
    #[arg(long, env = "PRINTDROP_DATABASE_URL", default_value = "sqlite://printdrop.db?mode=rwc")]
    pub database_url: String,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub store: StoreConfig,

    #[command(flatten)]
    pub print: PrintConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "PRINTDROP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the document API
    #[arg(long, env = "PRINTDROP_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the management endpoints (livez/readyz)
    #[arg(long, env = "PRINTDROP_MGMT_PORT", default_value_t = 3001)]
    pub mgmt_port: u16,

    /// How long to wait for background tasks during shutdown
    #[arg(long, env = "PRINTDROP_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct StoreConfig {
    /// Default document time-to-live in minutes when the uploader gives none
    #[arg(long, env = "PRINTDROP_DEFAULT_TTL_MINUTES", default_value_t = 15)]
    pub default_ttl_minutes: i64,

    /// Maximum permitted document time-to-live in minutes
    #[arg(long, env = "PRINTDROP_MAX_TTL_MINUTES", default_value_t = 360)]
    pub max_ttl_minutes: i64,

    /// How often the expiry sweep runs. Expired documents may outlive their
    /// nominal expiry by at most this interval if the deferred purge is lost.
    #[arg(long, env = "PRINTDROP_SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub sweep_interval_secs: u64,

    /// Maximum document size in bytes (Default: 50MB)
    #[arg(long, env = "PRINTDROP_MAX_DOCUMENT_SIZE_BYTES", default_value_t = 52_428_800)]
    pub max_document_size_bytes: usize,
}

#[derive(Clone, Debug, Args)]
pub struct PrintConfig {
    /// Line-printer command used on Unix-family hosts
    #[arg(long, env = "PRINTDROP_LP_PROGRAM", default_value = "lp")]
    pub lp_program: String,

    /// Shell host used on Windows for printer enumeration and the print verb
    #[arg(long, env = "PRINTDROP_WINDOWS_SHELL_PROGRAM", default_value = "powershell")]
    pub windows_shell_program: String,

    /// Helper invoked when the Windows shell host cannot be spawned
    #[arg(long, env = "PRINTDROP_WINDOWS_FALLBACK_PROGRAM", default_value = "rundll32")]
    pub windows_fallback_program: String,

    /// Upper bound on any single print command execution
    #[arg(long, env = "PRINTDROP_COMMAND_TIMEOUT_SECS", default_value_t = 10)]
    pub command_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the readiness database check
    #[arg(long, env = "PRINTDROP_HEALTH_DB_TIMEOUT_MS", default_value_t = 500)]
    pub db_timeout_ms: u64,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP endpoint for traces and metrics; telemetry export is disabled when unset
    #[arg(long, env = "PRINTDROP_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "PRINTDROP_LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
