use expresarte_config::LoggingConfig;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Console-only logging.
///
/// `RUST_LOG` wins when set; otherwise the workspace crates log at
/// `config.level` and noisy dependencies at `warn`.
pub fn init_basic_console_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(console_layer).try_init()?;
    Ok(())
}

pub(crate) fn default_directives(level: &str) -> String {
    format!(
        "expresarte={level},expresarte_db={level},expresarte_auth={level},expresarte_cli={level},sqlx=warn,tonic=warn,h2=warn"
    )
}
