use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::BookingStatus;
use crate::models::evidence::EvidenceBundle;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActionKind {
    StatusUpdate,
    CollectionConfirmation,
    DeliveryCompletion,
}

impl ActionKind {
    pub fn for_target(target: BookingStatus) -> Self {
        match target {
            BookingStatus::Collected => ActionKind::CollectionConfirmation,
            BookingStatus::Delivered => ActionKind::DeliveryCompletion,
            _ => ActionKind::StatusUpdate,
        }
    }
}

/// One deferred mutation, recorded while the connectivity signal read
/// offline. The id is derived from the enqueue timestamp in milliseconds;
/// the queue bumps it past the previous id when two actions land in the
/// same millisecond.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineAction {
    pub id: i64,
    pub booking_id: Uuid,
    pub kind: ActionKind,
    pub target: BookingStatus,
    pub evidence: EvidenceBundle,
    pub created_at: DateTime<Utc>,
}

impl OfflineAction {
    pub fn new(
        id: i64,
        booking_id: Uuid,
        target: BookingStatus,
        evidence: EvidenceBundle,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            booking_id,
            kind: ActionKind::for_target(target),
            target,
            evidence,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ActionKind;
    use crate::models::booking::BookingStatus;

    #[test]
    fn kind_follows_target_status() {
        assert_eq!(
            ActionKind::for_target(BookingStatus::Collected),
            ActionKind::CollectionConfirmation
        );
        assert_eq!(
            ActionKind::for_target(BookingStatus::Delivered),
            ActionKind::DeliveryCompletion
        );
        assert_eq!(
            ActionKind::for_target(BookingStatus::InTransit),
            ActionKind::StatusUpdate
        );
    }
}
