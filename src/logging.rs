//! Diagnostics for the host. Runtime `LOG` frames arrive under the `runtime` target.

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    /// `MARLIN_LOG_JSON=1` (or `true`) selects JSON lines.
    pub fn from_env() -> Self {
        Self::from_flag(std::env::var("MARLIN_LOG_JSON").ok().as_deref())
    }

    fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(str::trim) {
            Some("1") | Some("true") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` filters; a second call is a no-op.
pub fn init_logging() {
    init_logging_as(LogFormat::from_env());
}

pub fn init_logging_as(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("subscriber already installed");
    }
}
