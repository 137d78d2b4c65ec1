use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::Booking;

/// Human-readable record appended on every successful booking mutation.
/// Actor-agnostic; readers filter by party id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub waybill: String,
    pub shipper_id: Uuid,
    pub carrier_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn for_booking(booking: &Booking, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            waybill: booking.waybill.clone(),
            shipper_id: booking.shipper_id,
            carrier_id: booking.carrier_id,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn visible_to(&self, entity_id: Uuid) -> bool {
        self.shipper_id == entity_id || self.carrier_id == entity_id
    }
}
