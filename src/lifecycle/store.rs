use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::lifecycle::policy;
use crate::models::booking::{Booking, BookingStatus, PaymentStatus, Role};
use crate::models::evidence::{DeliveryEvidence, EvidenceBundle};
use crate::models::notification::Notification;
use crate::state::AppState;
use crate::storage::{BOOKINGS_KEY, NOTIFICATIONS_KEY};
use crate::sync::projection;

/// Result of a mutation attempt: either the authoritative store confirmed
/// it, or connectivity was down and it went onto the offline queue with the
/// optimistic view of what it will produce. The projection step is the only
/// place allowed to merge provisional results back into a view.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApplyOutcome {
    Confirmed { booking: Booking },
    Queued { action_id: i64, booking: Booking },
}

pub struct NewBooking {
    pub shipper_id: Uuid,
    pub shipper_name: String,
    pub carrier_id: Uuid,
    pub carrier_name: String,
    pub origin: String,
    pub destination: String,
    pub pickup_date: NaiveDate,
    pub rate: f64,
    pub price: f64,
    pub delivery_pin: Option<String>,
}

pub async fn create(state: &AppState, new: NewBooking) -> Result<Booking, AppError> {
    let now = Utc::now();
    let booking = Booking {
        id: Uuid::new_v4(),
        waybill: Booking::waybill_number(),
        shipper_id: new.shipper_id,
        shipper_name: new.shipper_name,
        carrier_id: new.carrier_id,
        carrier_name: new.carrier_name,
        origin: new.origin,
        destination: new.destination,
        pickup_date: new.pickup_date,
        status: BookingStatus::Pending,
        rate: new.rate,
        price: new.price,
        payment_status: PaymentStatus::Escrow,
        delivery_pin: new.delivery_pin,
        evidence: DeliveryEvidence::default(),
        created_at: now,
        updated_at: now,
    };

    state.bookings.insert(booking.id, booking.clone());
    persist_bookings(state).await;

    let message = format!(
        "Booking {} created: {} to {}",
        booking.waybill, booking.origin, booking.destination
    );
    notify(state, &booking, message).await;

    info!(booking_id = %booking.id, waybill = %booking.waybill, "booking created");
    Ok(booking)
}

/// Bookings visible to one participant. The carrier side is the driver
/// view: unaccepted, completed and disputed bookings are excluded.
pub fn scoped(state: &AppState, role: Role, entity_id: Uuid) -> Vec<Booking> {
    let mut bookings: Vec<Booking> = state
        .bookings
        .iter()
        .filter_map(|entry| {
            let booking = entry.value();
            let visible = match role {
                Role::Shipper => booking.shipper_id == entity_id,
                Role::Carrier => {
                    booking.carrier_id == entity_id
                        && !matches!(
                            booking.status,
                            BookingStatus::Pending
                                | BookingStatus::Completed
                                | BookingStatus::Disputed
                        )
                }
            };

            visible.then(|| booking.clone())
        })
        .collect();

    bookings.sort_by_key(|booking| booking.created_at);
    bookings
}

/// Validated transition against the authoritative store. Rejection leaves
/// the booking untouched.
pub async fn apply(
    state: &AppState,
    booking_id: Uuid,
    target: BookingStatus,
    evidence: &EvidenceBundle,
) -> Result<Booking, AppError> {
    let updated = {
        let mut booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {} not found", booking_id)))?;

        if let Err(err) = policy::validate(&booking, target, evidence) {
            state
                .metrics
                .transitions_total
                .with_label_values(&["rejected"])
                .inc();
            return Err(err.into());
        }

        policy::apply_unchecked(&mut booking, target, evidence, Utc::now());
        booking.clone()
    };

    persist_bookings(state).await;
    notify(state, &updated, transition_message(&updated)).await;

    state
        .metrics
        .transitions_total
        .with_label_values(&["confirmed"])
        .inc();

    info!(
        booking_id = %updated.id,
        waybill = %updated.waybill,
        status = %updated.status,
        "booking transition applied"
    );

    Ok(updated)
}

/// The single mutation entry point for role-driven actions. Online requests
/// go straight to the authoritative store; offline requests are validated
/// against the projected state (same policy, so a bad action is rejected
/// inline instead of poisoning the queue), then recorded for replay.
pub async fn submit(
    state: &AppState,
    booking_id: Uuid,
    target: BookingStatus,
    evidence: EvidenceBundle,
) -> Result<ApplyOutcome, AppError> {
    if state.connectivity.is_online() {
        let booking = apply(state, booking_id, target, &evidence).await?;
        return Ok(ApplyOutcome::Confirmed { booking });
    }

    let authoritative = state
        .bookings
        .get(&booking_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", booking_id)))?;

    let pending = state.queue.snapshot().await;
    let projected = projection::project_booking(authoritative, &pending);

    if let Err(err) = policy::validate(&projected, target, &evidence) {
        state
            .metrics
            .transitions_total
            .with_label_values(&["rejected"])
            .inc();
        return Err(err.into());
    }

    let action = state.queue.enqueue(booking_id, target, evidence).await?;
    state.metrics.actions_queued.inc();
    state
        .metrics
        .transitions_total
        .with_label_values(&["queued"])
        .inc();

    info!(
        booking_id = %booking_id,
        action_id = action.id,
        target = %target,
        "connectivity offline; action queued for replay"
    );

    let mut optimistic = projected;
    policy::apply_unchecked(&mut optimistic, action.target, &action.evidence, action.created_at);

    Ok(ApplyOutcome::Queued {
        action_id: action.id,
        booking: optimistic,
    })
}

/// External dispute-open event. Bypasses the successor chain (any
/// non-terminal booking can be disputed) but still refuses terminal ones.
pub async fn open_dispute(
    state: &AppState,
    booking_id: Uuid,
    reason: Option<String>,
) -> Result<Booking, AppError> {
    if let Some(reason) = &reason {
        info!(booking_id = %booking_id, reason = %reason, "dispute opened");
    }

    apply(state, booking_id, BookingStatus::Disputed, &EvidenceBundle::default()).await
}

async fn persist_bookings(state: &AppState) {
    let mut snapshot: Vec<Booking> = state
        .bookings
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    snapshot.sort_by_key(|booking| booking.created_at);

    if let Err(err) = state.store.save(BOOKINGS_KEY, &snapshot).await {
        warn!(error = %err, "failed to persist bookings; continuing in memory");
    }
}

async fn notify(state: &AppState, booking: &Booking, message: String) {
    let notification = Notification::for_booking(booking, message);

    {
        let mut log = state.notifications.write().await;
        log.push(notification.clone());

        if let Err(err) = state.store.save(NOTIFICATIONS_KEY, &*log).await {
            warn!(error = %err, "failed to persist notifications; continuing in memory");
        }
    }

    let _ = state.notification_events_tx.send(notification);
}

fn transition_message(booking: &Booking) -> String {
    let waybill = &booking.waybill;
    match booking.status {
        BookingStatus::Pending => format!("Booking {} created", waybill),
        BookingStatus::Accepted => {
            format!("Booking {} accepted by {}", waybill, booking.carrier_name)
        }
        BookingStatus::ArrivedAtPickup => {
            format!("{} arrived at pickup for {}", booking.carrier_name, waybill)
        }
        BookingStatus::Collected => format!("Load {} collected", waybill),
        BookingStatus::InTransit => format!("{} is in transit", waybill),
        BookingStatus::ArrivedAtDelivery => format!("{} arrived at the delivery point", waybill),
        BookingStatus::Delivered => format!("{} delivered, awaiting shipper verification", waybill),
        BookingStatus::Completed => format!("{} verified, escrow payment released", waybill),
        BookingStatus::Disputed => format!("{} is under dispute", waybill),
    }
}
