use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::lifecycle::store::{self, ApplyOutcome, NewBooking};
use crate::models::booking::{Booking, BookingStatus, Role};
use crate::models::evidence::EvidenceBundle;
use crate::models::notification::Notification;
use crate::state::AppState;
use crate::sync::projection;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/transition", post(submit_transition))
        .route("/bookings/:id/verify", post(verify_delivery))
        .route("/bookings/:id/dispute", post(open_dispute))
        .route("/driver/:carrier_id/jobs", get(driver_jobs))
        .route("/notifications", get(list_notifications))
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
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

#[derive(Deserialize)]
pub struct BookingScope {
    pub role: Role,
    pub entity_id: Uuid,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub target: BookingStatus,
    #[serde(default)]
    pub evidence: EvidenceBundle,
}

#[derive(Deserialize)]
pub struct DisputeRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct NotificationScope {
    pub entity_id: Uuid,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    if payload.shipper_name.trim().is_empty() || payload.carrier_name.trim().is_empty() {
        return Err(AppError::BadRequest("party names cannot be empty".to_string()));
    }

    if payload.origin.trim().is_empty() || payload.destination.trim().is_empty() {
        return Err(AppError::BadRequest("route cannot be empty".to_string()));
    }

    if payload.rate <= 0.0 {
        return Err(AppError::BadRequest("rate must be > 0".to_string()));
    }

    if payload.price < payload.rate {
        return Err(AppError::BadRequest("price cannot be below the carrier rate".to_string()));
    }

    if matches!(&payload.delivery_pin, Some(pin) if pin.trim().is_empty()) {
        return Err(AppError::BadRequest("delivery pin cannot be blank".to_string()));
    }

    let booking = store::create(
        &state,
        NewBooking {
            shipper_id: payload.shipper_id,
            shipper_name: payload.shipper_name,
            carrier_id: payload.carrier_id,
            carrier_name: payload.carrier_name,
            origin: payload.origin,
            destination: payload.destination,
            pickup_date: payload.pickup_date,
            rate: payload.rate,
            price: payload.price,
            delivery_pin: payload.delivery_pin,
        },
    )
    .await?;

    Ok(Json(booking))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(scope): Query<BookingScope>,
) -> Json<Vec<Booking>> {
    Json(store::scoped(&state, scope.role, scope.entity_id))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))?;

    Ok(Json(booking.value().clone()))
}

async fn submit_transition(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<ApplyOutcome>, AppError> {
    let outcome = store::submit(&state, id, payload.target, payload.evidence).await?;
    Ok(Json(outcome))
}

/// Shipper verification of a delivered booking: the Completed transition,
/// which also releases the escrow payment.
async fn verify_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking =
        store::apply(&state, id, BookingStatus::Completed, &EvidenceBundle::default()).await?;
    Ok(Json(booking))
}

async fn open_dispute(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DisputeRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = store::open_dispute(&state, id, payload.reason).await?;
    Ok(Json(booking))
}

/// The optimistic driver view: active jobs for a carrier with queued,
/// not-yet-confirmed actions layered on top of the authoritative records.
async fn driver_jobs(
    State(state): State<Arc<AppState>>,
    Path(carrier_id): Path<Uuid>,
) -> Json<Vec<Booking>> {
    let snapshot = store::scoped(&state, Role::Carrier, carrier_id);
    let pending = state.queue.snapshot().await;
    Json(projection::project(snapshot, &pending))
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(scope): Query<NotificationScope>,
) -> Json<Vec<Notification>> {
    let log = state.notifications.read().await;
    let mut visible: Vec<Notification> = log
        .iter()
        .filter(|notification| notification.visible_to(scope.entity_id))
        .cloned()
        .collect();
    visible.reverse();
    Json(visible)
}
