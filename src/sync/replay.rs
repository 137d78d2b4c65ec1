use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::lifecycle::store;
use crate::models::action::OfflineAction;
use crate::state::AppState;

/// Background task that drains the offline queue whenever the connectivity
/// signal comes up: once at startup if already online, then on every
/// offline-to-online edge.
pub async fn run_replay_engine(state: Arc<AppState>, mut online_rx: watch::Receiver<bool>) {
    info!("replay engine started");

    if *online_rx.borrow_and_update() {
        drain_queue(&state).await;
    }

    while online_rx.changed().await.is_ok() {
        let online = *online_rx.borrow_and_update();
        if online {
            drain_queue(&state).await;
        }
    }

    warn!("replay engine stopped: connectivity channel closed");
}

/// Replay pending actions one at a time, in enqueue order, waiting for each
/// to finish before starting the next. A failed action is logged and
/// dropped, not retried. The small inter-action delay keeps a long queue
/// from hammering the store; it is pacing, not correctness.
async fn drain_queue(state: &AppState) {
    let pending = state.queue.snapshot().await;
    if pending.is_empty() {
        return;
    }

    info!(pending = pending.len(), "connectivity restored; replaying queued actions");

    let mut drained = Vec::with_capacity(pending.len());
    for action in &pending {
        let start = Instant::now();
        match replay_action(state, action).await {
            Ok(()) => {
                let elapsed = start.elapsed().as_secs_f64();
                state
                    .metrics
                    .replay_latency_seconds
                    .with_label_values(&["success"])
                    .observe(elapsed);
                state
                    .metrics
                    .replays_total
                    .with_label_values(&["success"])
                    .inc();
            }
            Err(err) => {
                let elapsed = start.elapsed().as_secs_f64();
                state
                    .metrics
                    .replay_latency_seconds
                    .with_label_values(&["error"])
                    .observe(elapsed);
                state
                    .metrics
                    .replays_total
                    .with_label_values(&["error"])
                    .inc();
                error!(
                    action_id = action.id,
                    booking_id = %action.booking_id,
                    error = %err,
                    "queued action failed during replay; dropping it"
                );
            }
        }

        drained.push(action.id);
        sleep(state.replay_delay).await;
    }

    if let Err(err) = state.queue.remove(&drained).await {
        warn!(error = %err, "failed to clear drained actions from durable storage");
    }

    state.metrics.actions_queued.set(state.queue.len().await as i64);
    info!(replayed = drained.len(), "offline queue drained");
}

async fn replay_action(state: &AppState, action: &OfflineAction) -> Result<(), AppError> {
    // Reconstruct every binary attachment from its transportable form before
    // resubmitting; corrupt data fails the whole action.
    for attachment in action.evidence.attachments() {
        attachment
            .decode()
            .map_err(|err| AppError::BadRequest(format!("corrupt attachment: {err}")))?;
    }

    store::apply(state, action.booking_id, action.target, &action.evidence).await?;
    Ok(())
}
