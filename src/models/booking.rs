use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::evidence::DeliveryEvidence;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Which side of the marketplace a caller acts for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Shipper,
    Carrier,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Escrow,
    Released,
}

/// Delivery lifecycle. Forward movement only follows `successor`; the one
/// side exit is `Disputed`, reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Accepted,
    ArrivedAtPickup,
    Collected,
    InTransit,
    ArrivedAtDelivery,
    Delivered,
    Completed,
    Disputed,
}

impl BookingStatus {
    pub fn successor(&self) -> Option<BookingStatus> {
        match self {
            BookingStatus::Pending => Some(BookingStatus::Accepted),
            BookingStatus::Accepted => Some(BookingStatus::ArrivedAtPickup),
            BookingStatus::ArrivedAtPickup => Some(BookingStatus::Collected),
            BookingStatus::Collected => Some(BookingStatus::InTransit),
            BookingStatus::InTransit => Some(BookingStatus::ArrivedAtDelivery),
            BookingStatus::ArrivedAtDelivery => Some(BookingStatus::Delivered),
            BookingStatus::Delivered => Some(BookingStatus::Completed),
            BookingStatus::Completed | BookingStatus::Disputed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Disputed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Accepted => "Accepted",
            BookingStatus::ArrivedAtPickup => "ArrivedAtPickup",
            BookingStatus::Collected => "Collected",
            BookingStatus::InTransit => "InTransit",
            BookingStatus::ArrivedAtDelivery => "ArrivedAtDelivery",
            BookingStatus::Delivered => "Delivered",
            BookingStatus::Completed => "Completed",
            BookingStatus::Disputed => "Disputed",
        };
        f.write_str(name)
    }
}

/// One shipment contract between a shipper and a carrier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub waybill: String,
    pub shipper_id: Uuid,
    pub shipper_name: String,
    pub carrier_id: Uuid,
    pub carrier_name: String,
    pub origin: String,
    pub destination: String,
    pub pickup_date: NaiveDate,
    pub status: BookingStatus,
    /// Carrier earning.
    pub rate: f64,
    /// Shipper-facing price, markup included.
    pub price: f64,
    pub payment_status: PaymentStatus,
    /// When set, delivery requires this exact PIN instead of a signature.
    pub delivery_pin: Option<String>,
    pub evidence: DeliveryEvidence,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn waybill_number() -> String {
        let tag = Uuid::new_v4().simple().to_string();
        format!("WB-{}", tag[..8].to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::BookingStatus;

    #[test]
    fn successor_chain_ends_at_completed() {
        let mut status = BookingStatus::Pending;
        let mut hops = 0;
        while let Some(next) = status.successor() {
            status = next;
            hops += 1;
        }
        assert_eq!(status, BookingStatus::Completed);
        assert_eq!(hops, 7);
    }

    #[test]
    fn terminal_statuses_have_no_successor() {
        assert!(BookingStatus::Completed.successor().is_none());
        assert!(BookingStatus::Disputed.successor().is_none());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Disputed.is_terminal());
        assert!(!BookingStatus::Delivered.is_terminal());
    }
}
