use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.telemetry().log_level.clone()));

    let builder = fmt().with_env_filter(filter).with_target(false);

    let installed = if settings.telemetry().json {
        builder.json().with_span_events(fmt::format::FmtSpan::CLOSE).try_init()
    } else {
        builder.with_span_events(fmt::format::FmtSpan::CLOSE).try_init()
    };
    installed.map_err(|err| anyhow::anyhow!(err.to_string()))?;

    log_startup_warnings(settings);
    Ok(())
}

fn log_startup_warnings(settings: &Settings) {
    if settings.security().secret_key_generated {
        tracing::warn!(
            "SECRET_KEY not configured; using an ephemeral key, issued tokens will not survive a restart"
        );
    }

    if !settings.sync().sync_on_submit {
        tracing::info!("SYNC_ON_SUBMIT disabled; marks are pushed by the sweep worker only");
    }
}
