use crate::config::PrintConfig;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;

pub mod trace;
mod unix;
mod windows;

pub use trace::DebugTrace;

/// Host platform family, detected once and fixed for the dispatcher's
/// lifetime. An unrecognized family fails every request with
/// `UnsupportedPlatform`; there is nothing to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
    Unsupported(&'static str),
}

impl Platform {
    #[must_use]
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "linux" | "macos" | "freebsd" | "openbsd" | "netbsd" => Self::Unix,
            other => Self::Unsupported(other),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "Windows"),
            Self::Unix => write!(f, "Unix"),
            Self::Unsupported(os) => write!(f, "{os}"),
        }
    }
}

/// Structured dispatch result. Failures are encoded here, never raised past
/// the dispatcher, so callers always receive a complete outcome with its trace.
#[derive(Debug, Clone)]
pub struct PrintOutcome {
    pub success: bool,
    pub message: String,
    pub debug_trace: String,
}

#[derive(Error, Debug)]
pub(crate) enum PrintError {
    #[error("Unsupported operating system: {0}")]
    UnsupportedPlatform(&'static str),
    #[error("Printer '{name}' not found. Available printers: {available}")]
    PrinterNotFound { name: String, available: String },
    #[error("{0}")]
    CommandFailed(String),
    #[error("could not write temporary file: {0}")]
    TempFile(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub(crate) enum CommandError {
    #[error("could not spawn process: {0}")]
    Spawn(std::io::Error),
    #[error("timed out after {0}s")]
    Timeout(u64),
}

#[derive(Debug)]
pub(crate) struct CommandOutput {
    pub(crate) status: Option<i32>,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl CommandOutput {
    pub(crate) fn success(&self) -> bool {
        self.status == Some(0)
    }
}

#[derive(Clone, Debug)]
struct Metrics {
    dispatch_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("printdrop-server");
        Self {
            dispatch_total: meter
                .u64_counter("printdrop_print_dispatch_total")
                .with_description("Total print dispatch requests by outcome")
                .build(),
        }
    }
}

/// Executes print requests against the host OS.
///
/// Per request: write the payload to a scoped temporary file, branch on the
/// platform tag, run the strategy, and return the outcome together with the
/// accumulated debug trace. The temporary file is released on every exit path,
/// panics included, by RAII.
#[derive(Clone, Debug)]
pub struct PrintDispatcher {
    config: PrintConfig,
    platform: Platform,
    metrics: Metrics,
}

impl PrintDispatcher {
    #[must_use]
    pub fn new(config: PrintConfig) -> Self {
        Self::with_platform(Platform::detect(), config)
    }

    /// Constructs a dispatcher with a fixed platform tag instead of detecting
    /// the host. Lets tests drive the Windows and unsupported branches from
    /// any host.
    #[must_use]
    pub fn with_platform(platform: Platform, config: PrintConfig) -> Self {
        Self { config, platform, metrics: Metrics::new() }
    }

    /// Dispatches `content` to the resolved printer.
    ///
    /// Never returns an error: every failure is folded into the outcome with
    /// `success = false` and the trace collected so far.
    #[tracing::instrument(skip(self, content), fields(size = content.len(), platform = %self.platform))]
    pub async fn dispatch(&self, content: &[u8], printer_name: Option<&str>) -> PrintOutcome {
        let mut trace = DebugTrace::new();

        match self.dispatch_inner(content, printer_name, &mut trace).await {
            Ok(message) => {
                tracing::info!(message = %message, "Print dispatch succeeded");
                self.metrics.dispatch_total.add(1, &[KeyValue::new("outcome", "success")]);
                PrintOutcome { success: true, message, debug_trace: trace.render() }
            }
            Err(e) => {
                let message = format!("Print failed: {e}");
                trace.push(message.clone());
                tracing::warn!(error = %e, "Print dispatch failed");
                self.metrics.dispatch_total.add(1, &[KeyValue::new("outcome", "failure")]);
                PrintOutcome { success: false, message, debug_trace: trace.render() }
            }
        }
    }

    async fn dispatch_inner(
        &self,
        content: &[u8],
        printer_name: Option<&str>,
        trace: &mut DebugTrace,
    ) -> Result<String, PrintError> {
        // Suffix preserved so shell print-verb resolution sees a document type.
        let temp = tempfile::Builder::new().prefix("printdrop-").suffix(".pdf").tempfile()?;
        tokio::fs::write(temp.path(), content).await?;

        trace.push(format!("System: {}", self.platform));
        trace.push(format!("Temporary file created at: {}", temp.path().display()));

        match self.platform {
            Platform::Windows => self.print_windows(temp.path(), printer_name, trace).await,
            Platform::Unix => self.print_unix(temp.path(), printer_name, trace).await,
            Platform::Unsupported(os) => Err(PrintError::UnsupportedPlatform(os)),
        }
        // temp dropped here: the file is removed on success and failure alike
    }

    pub(crate) async fn run_command(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        let timeout = Duration::from_secs(self.config.command_timeout_secs);

        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(CommandError::Spawn)?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| CommandError::Timeout(self.config.command_timeout_secs))?
            .map_err(CommandError::Spawn)?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    pub(crate) const fn config(&self) -> &PrintConfig {
        &self.config
    }
}
