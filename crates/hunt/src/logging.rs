use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Noisy dependencies kept at warn whatever the base level
const QUIET_DEPENDENCIES: &str = "tokio_postgres=warn,hyper=warn,reqwest=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, for collectors
    Json,
    /// Multi-line human output for watching a walk in a terminal
    Pretty,
}

impl LogFormat {
    pub fn from_args(args: &[String]) -> Self {
        if args.iter().any(|arg| arg == "--pretty") {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }

    /// Filter used when RUST_LOG is unset
    pub fn default_filter(self) -> String {
        let base = match self {
            LogFormat::Json => "info",
            LogFormat::Pretty => "debug,proximity=trace",
        };
        format!("{},{}", base, QUIET_DEPENDENCIES)
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format.default_filter()));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .json(),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .pretty(),
            )
            .try_init()?,
    }

    tracing::info!(?format, "Logging initialized");
    Ok(())
}
