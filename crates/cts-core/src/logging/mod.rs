//! Logging setup for the `cts` binary.
//!
//! - stdout is reserved for command payloads (reports, generated text)
//! - stderr receives all log output, human-readable or JSON lines
//! - every invocation gets a run id, attached to a root span

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging subsystem.
///
/// Call once at startup. `RUST_LOG` directives win over `config.level` when
/// set; otherwise only this crate's events at `config.level` are shown.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cts={0},cts_core={0},cts_config={0}", config.level)));

    match config.format {
        LogFormat::Human => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal())
                .with_file(config.source_location)
                .with_line_number(config.source_location);

            let registry = tracing_subscriber::registry().with(filter);
            let result = if config.timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            };
            if result.is_err() {
                tracing::debug!("logging already initialised");
            }
        }
        LogFormat::Jsonl => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_file(config.source_location)
                .with_line_number(config.source_location);
            if tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
                .is_err()
            {
                tracing::debug!("logging already initialised");
            }
        }
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}
