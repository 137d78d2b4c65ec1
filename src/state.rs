use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::config::Config;
use crate::models::booking::Booking;
use crate::models::notification::Notification;
use crate::observability::metrics::Metrics;
use crate::storage::{LocalStore, BOOKINGS_KEY, NOTIFICATIONS_KEY};
use crate::sync::connectivity::Connectivity;
use crate::sync::queue::OfflineQueue;

/// Process-wide application state. The booking map is the single owner of
/// all booking records; everything else references them by id.
pub struct AppState {
    pub bookings: DashMap<Uuid, Booking>,
    pub notifications: RwLock<Vec<Notification>>,
    pub queue: OfflineQueue,
    pub connectivity: Connectivity,
    pub notification_events_tx: broadcast::Sender<Notification>,
    pub metrics: Metrics,
    pub store: LocalStore,
    pub replay_delay: Duration,
}

impl AppState {
    /// Restore persisted state from the local store. Missing or corrupt keys
    /// fall back to empty collections; the connectivity signal starts online.
    pub async fn load(store: LocalStore, config: &Config) -> Self {
        let persisted: Vec<Booking> = store.load_or_default(BOOKINGS_KEY).await;
        let bookings = DashMap::new();
        for booking in persisted {
            bookings.insert(booking.id, booking);
        }

        let notifications: Vec<Notification> = store.load_or_default(NOTIFICATIONS_KEY).await;
        let queue = OfflineQueue::load(store.clone()).await;

        let (notification_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        let metrics = Metrics::new();
        metrics.actions_queued.set(queue.len().await as i64);

        Self {
            bookings,
            notifications: RwLock::new(notifications),
            queue,
            connectivity: Connectivity::new(true),
            notification_events_tx,
            metrics,
            store,
            replay_delay: Duration::from_millis(config.replay_delay_ms),
        }
    }
}
