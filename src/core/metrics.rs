use std::sync::OnceLock;

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) const QUIZ_SUBMISSIONS_TOTAL: &str = "quiz_submissions_total";
pub(crate) const MARKS_SYNC_TOTAL: &str = "marks_sync_total";
pub(crate) const MARKS_SYNC_SWEEP_ATTEMPTS_TOTAL: &str = "marks_sync_sweep_attempts_total";

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);

    describe_counter!(QUIZ_SUBMISSIONS_TOTAL, "Quiz submissions by outcome");
    describe_counter!(MARKS_SYNC_TOTAL, "Marks pushed to the analyzer by outcome");
    describe_counter!(
        MARKS_SYNC_SWEEP_ATTEMPTS_TOTAL,
        "Attempts picked up by the background marks sweep"
    );
    describe_counter!("http_requests_total", "HTTP requests by method, route and status");
    describe_histogram!("http_request_duration_seconds", "HTTP request latency");
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
