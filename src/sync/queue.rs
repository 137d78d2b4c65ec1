use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::action::OfflineAction;
use crate::models::booking::BookingStatus;
use crate::models::evidence::EvidenceBundle;
use crate::storage::{LocalStore, QUEUE_KEY};

/// Append-order queue of deferred mutations. Every enqueue is persisted to
/// the local store before it is acknowledged, so a process restart does not
/// lose pending actions. Order is never rearranged; the replay engine drains
/// front to back.
pub struct OfflineQueue {
    actions: Mutex<Vec<OfflineAction>>,
    store: LocalStore,
}

impl OfflineQueue {
    pub async fn load(store: LocalStore) -> Self {
        let actions: Vec<OfflineAction> = store.load_or_default(QUEUE_KEY).await;
        Self {
            actions: Mutex::new(actions),
            store,
        }
    }

    pub async fn enqueue(
        &self,
        booking_id: Uuid,
        target: BookingStatus,
        evidence: EvidenceBundle,
    ) -> Result<OfflineAction, AppError> {
        let mut actions = self.actions.lock().await;

        let now = Utc::now();
        let last_id = actions.last().map(|action| action.id).unwrap_or(0);
        let id = now.timestamp_millis().max(last_id + 1);

        let action = OfflineAction::new(id, booking_id, target, evidence, now);
        actions.push(action.clone());
        self.store.save(QUEUE_KEY, &*actions).await?;

        Ok(action)
    }

    pub async fn snapshot(&self) -> Vec<OfflineAction> {
        self.actions.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.actions.lock().await.len()
    }

    /// Remove the given actions after a drain. Anything enqueued while the
    /// drain was running stays put for the next round.
    pub async fn remove(&self, ids: &[i64]) -> Result<(), AppError> {
        let mut actions = self.actions.lock().await;
        actions.retain(|action| !ids.contains(&action.id));
        self.store.save(QUEUE_KEY, &*actions).await
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::OfflineQueue;
    use crate::models::booking::BookingStatus;
    use crate::models::evidence::EvidenceBundle;
    use crate::storage::LocalStore;

    #[tokio::test]
    async fn enqueue_assigns_strictly_increasing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let queue = OfflineQueue::load(LocalStore::new(dir.path())).await;
        let booking_id = Uuid::from_u128(7);

        let a = queue
            .enqueue(booking_id, BookingStatus::ArrivedAtPickup, EvidenceBundle::default())
            .await
            .unwrap();
        let b = queue
            .enqueue(booking_id, BookingStatus::Collected, EvidenceBundle::default())
            .await
            .unwrap();

        assert!(b.id > a.id);
        assert_eq!(queue.len().await, 2);
    }

    #[tokio::test]
    async fn queue_survives_a_reload_from_the_same_store() {
        let dir = tempfile::tempdir().unwrap();
        let booking_id = Uuid::from_u128(7);

        {
            let queue = OfflineQueue::load(LocalStore::new(dir.path())).await;
            queue
                .enqueue(booking_id, BookingStatus::InTransit, EvidenceBundle::default())
                .await
                .unwrap();
        }

        let reloaded = OfflineQueue::load(LocalStore::new(dir.path())).await;
        let pending = reloaded.snapshot().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].booking_id, booking_id);
        assert_eq!(pending[0].target, BookingStatus::InTransit);
    }

    #[tokio::test]
    async fn remove_only_touches_the_drained_ids() {
        let dir = tempfile::tempdir().unwrap();
        let queue = OfflineQueue::load(LocalStore::new(dir.path())).await;
        let booking_id = Uuid::from_u128(7);

        let a = queue
            .enqueue(booking_id, BookingStatus::ArrivedAtPickup, EvidenceBundle::default())
            .await
            .unwrap();
        let b = queue
            .enqueue(booking_id, BookingStatus::Collected, EvidenceBundle::default())
            .await
            .unwrap();

        queue.remove(&[a.id]).await.unwrap();

        let pending = queue.snapshot().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);
    }
}
