use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync/status", get(sync_status))
        .route("/sync/network", post(set_network))
        .route("/sync/override", post(set_override))
}

#[derive(Serialize)]
pub struct SyncStatus {
    pub online: bool,
    pub network_online: bool,
    pub forced_offline: bool,
    pub pending: usize,
}

#[derive(Deserialize)]
pub struct NetworkEvent {
    pub online: bool,
}

#[derive(Deserialize)]
pub struct OverrideRequest {
    pub forced_offline: bool,
}

async fn status(state: &AppState) -> SyncStatus {
    SyncStatus {
        online: state.connectivity.is_online(),
        network_online: state.connectivity.network_online(),
        forced_offline: state.connectivity.forced_offline(),
        pending: state.queue.len().await,
    }
}

async fn sync_status(State(state): State<Arc<AppState>>) -> Json<SyncStatus> {
    Json(status(&state).await)
}

/// Network-state event from the runtime. Flipping to online wakes the
/// replay engine.
async fn set_network(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NetworkEvent>,
) -> Json<SyncStatus> {
    state.connectivity.set_network(payload.online);
    Json(status(&state).await)
}

/// Manual offline override for testing and demos: while set, every mutation
/// queues regardless of actual connectivity.
async fn set_override(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OverrideRequest>,
) -> Json<SyncStatus> {
    state.connectivity.force_offline(payload.forced_offline);
    Json(status(&state).await)
}
