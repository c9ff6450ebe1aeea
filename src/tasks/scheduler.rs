use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::state::AppState;
use crate::tasks::marks_sync;

pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handles = vec![tokio::spawn(marks_sync_loop(state.clone(), shutdown_rx.clone()))];

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "Background task join failed");
        }
    }

    Ok(())
}

async fn marks_sync_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let sync = state.settings().sync();
    let batch_size = sync.sweep_batch_size;
    let mut tick = interval(Duration::from_secs(sync.sweep_interval_seconds));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        interval_seconds = sync.sweep_interval_seconds,
        batch_size,
        "Marks sync sweep scheduled"
    );

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = marks_sync::sync_pending_attempts(&state, batch_size).await {
                    tracing::error!(error = %err, "sync_pending_attempts failed");
                }
            }
        }
    }
}
