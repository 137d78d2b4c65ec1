use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::booking::{Booking, BookingStatus, PaymentStatus};
use crate::models::evidence::EvidenceBundle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("booking is already {0}")]
    Terminal(BookingStatus),

    #[error("{requested} does not follow {current}")]
    NotNext {
        current: BookingStatus,
        requested: BookingStatus,
    },

    #[error("missing required evidence: {0}")]
    MissingEvidence(&'static str),

    #[error("seal number required for a sealed load")]
    SealNumberMissing,

    #[error("delivery pin does not match")]
    PinMismatch,
}

/// Decide whether `requested` is a legal next status for `booking` given the
/// supplied evidence. Pure: no state is touched here. `Disputed` is the one
/// target reachable out of order, carried in from the dispute flow rather
/// than initiated by a driver action.
pub fn validate(
    booking: &Booking,
    requested: BookingStatus,
    evidence: &EvidenceBundle,
) -> Result<(), TransitionError> {
    let current = booking.status;

    if current.is_terminal() {
        return Err(TransitionError::Terminal(current));
    }

    if requested == BookingStatus::Disputed {
        return Ok(());
    }

    if current.successor() != Some(requested) {
        return Err(TransitionError::NotNext { current, requested });
    }

    match requested {
        BookingStatus::Collected => {
            if evidence.load_photo.is_none() {
                return Err(TransitionError::MissingEvidence("load photo"));
            }
            match evidence.sealed {
                None => return Err(TransitionError::MissingEvidence("seal flag")),
                Some(true) if evidence.seal_number.is_none() => {
                    return Err(TransitionError::SealNumberMissing);
                }
                Some(_) => {}
            }
        }
        BookingStatus::Delivered => {
            if evidence.offload_photo.is_none() {
                return Err(TransitionError::MissingEvidence("offload photo"));
            }
            if evidence.pod_photo.is_none() {
                return Err(TransitionError::MissingEvidence("proof of delivery"));
            }
            match &booking.delivery_pin {
                Some(expected) => match &evidence.pin {
                    None => return Err(TransitionError::MissingEvidence("delivery pin")),
                    Some(supplied) if supplied != expected => {
                        return Err(TransitionError::PinMismatch);
                    }
                    Some(_) => {}
                },
                None => {
                    if evidence.signature.is_none() {
                        return Err(TransitionError::MissingEvidence("signature"));
                    }
                }
            }
        }
        _ => {}
    }

    Ok(())
}

/// Apply an already-validated transition. This is the single mutation both
/// the authoritative store and the optimistic projection run, so the two
/// views can only differ in timing, never in shape. The effective timestamp
/// is a parameter: the store passes now, the projection passes the queued
/// action's creation time, keeping the projection deterministic.
pub fn apply_unchecked(
    booking: &mut Booking,
    target: BookingStatus,
    evidence: &EvidenceBundle,
    at: DateTime<Utc>,
) {
    match target {
        BookingStatus::Collected => {
            booking.evidence.collection_photo = evidence.load_photo.clone();
            booking.evidence.sealed = evidence.sealed;
            booking.evidence.seal_number = evidence.seal_number.clone();
            booking.evidence.collection_location = evidence.location;
        }
        BookingStatus::Delivered => {
            booking.evidence.offload_photo = evidence.offload_photo.clone();
            booking.evidence.pod_photo = evidence.pod_photo.clone();
            booking.evidence.signature = evidence.signature.clone();
            booking.evidence.delivery_location = evidence.location;
        }
        BookingStatus::Completed => {
            booking.payment_status = PaymentStatus::Released;
        }
        _ => {}
    }

    booking.status = target;
    booking.updated_at = at;
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::{apply_unchecked, validate, TransitionError};
    use crate::models::booking::{Booking, BookingStatus, PaymentStatus};
    use crate::models::evidence::{Attachment, DeliveryEvidence, EvidenceBundle};

    fn booking(status: BookingStatus, pin: Option<&str>) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::from_u128(1),
            waybill: "WB-TEST0001".to_string(),
            shipper_id: Uuid::from_u128(2),
            shipper_name: "Acme Exports".to_string(),
            carrier_id: Uuid::from_u128(3),
            carrier_name: "Haulage Co".to_string(),
            origin: "Johannesburg".to_string(),
            destination: "Durban".to_string(),
            pickup_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            status,
            rate: 12_000.0,
            price: 13_800.0,
            payment_status: PaymentStatus::Escrow,
            delivery_pin: pin.map(str::to_string),
            evidence: DeliveryEvidence::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn photo() -> Attachment {
        Attachment::from_bytes("image/jpeg", b"jpeg-bytes", Utc::now(), None)
    }

    fn collection_evidence(sealed: bool, seal_number: Option<&str>) -> EvidenceBundle {
        EvidenceBundle {
            load_photo: Some(photo()),
            sealed: Some(sealed),
            seal_number: seal_number.map(str::to_string),
            ..EvidenceBundle::default()
        }
    }

    fn delivery_evidence(pin: Option<&str>, signature: bool) -> EvidenceBundle {
        EvidenceBundle {
            offload_photo: Some(photo()),
            pod_photo: Some(photo()),
            signature: signature.then(photo),
            pin: pin.map(str::to_string),
            ..EvidenceBundle::default()
        }
    }

    #[test]
    fn skipping_a_status_is_rejected() {
        let b = booking(BookingStatus::Accepted, None);
        let err = validate(&b, BookingStatus::Collected, &collection_evidence(false, None));
        assert_eq!(
            err,
            Err(TransitionError::NotNext {
                current: BookingStatus::Accepted,
                requested: BookingStatus::Collected,
            })
        );
    }

    #[test]
    fn collection_without_evidence_is_rejected() {
        let b = booking(BookingStatus::ArrivedAtPickup, None);
        let err = validate(&b, BookingStatus::Collected, &EvidenceBundle::default());
        assert_eq!(err, Err(TransitionError::MissingEvidence("load photo")));
    }

    #[test]
    fn collection_without_seal_flag_is_rejected() {
        let b = booking(BookingStatus::ArrivedAtPickup, None);
        let evidence = EvidenceBundle {
            load_photo: Some(photo()),
            ..EvidenceBundle::default()
        };
        let err = validate(&b, BookingStatus::Collected, &evidence);
        assert_eq!(err, Err(TransitionError::MissingEvidence("seal flag")));
    }

    #[test]
    fn sealed_collection_requires_seal_number() {
        let b = booking(BookingStatus::ArrivedAtPickup, None);
        let err = validate(&b, BookingStatus::Collected, &collection_evidence(true, None));
        assert_eq!(err, Err(TransitionError::SealNumberMissing));
    }

    #[test]
    fn sealed_collection_with_seal_number_passes_and_persists_seal_fields() {
        let mut b = booking(BookingStatus::ArrivedAtPickup, None);
        let evidence = collection_evidence(true, Some("SEAL-001"));

        validate(&b, BookingStatus::Collected, &evidence).unwrap();
        apply_unchecked(&mut b, BookingStatus::Collected, &evidence, Utc::now());

        assert_eq!(b.status, BookingStatus::Collected);
        assert_eq!(b.evidence.sealed, Some(true));
        assert_eq!(b.evidence.seal_number.as_deref(), Some("SEAL-001"));
        assert!(b.evidence.collection_photo.is_some());
    }

    #[test]
    fn delivery_pin_must_match_exactly() {
        let b = booking(BookingStatus::ArrivedAtDelivery, Some("482913"));

        let wrong = validate(&b, BookingStatus::Delivered, &delivery_evidence(Some("482914"), false));
        assert_eq!(wrong, Err(TransitionError::PinMismatch));

        let absent = validate(&b, BookingStatus::Delivered, &delivery_evidence(None, false));
        assert_eq!(absent, Err(TransitionError::MissingEvidence("delivery pin")));

        let right = validate(&b, BookingStatus::Delivered, &delivery_evidence(Some("482913"), false));
        assert_eq!(right, Ok(()));
    }

    #[test]
    fn delivery_without_pin_requires_signature() {
        let b = booking(BookingStatus::ArrivedAtDelivery, None);

        let unsigned = validate(&b, BookingStatus::Delivered, &delivery_evidence(None, false));
        assert_eq!(unsigned, Err(TransitionError::MissingEvidence("signature")));

        let signed = validate(&b, BookingStatus::Delivered, &delivery_evidence(None, true));
        assert_eq!(signed, Ok(()));
    }

    #[test]
    fn delivery_requires_offload_and_pod_photos() {
        let b = booking(BookingStatus::ArrivedAtDelivery, None);
        let evidence = EvidenceBundle {
            signature: Some(photo()),
            ..EvidenceBundle::default()
        };
        let err = validate(&b, BookingStatus::Delivered, &evidence);
        assert_eq!(err, Err(TransitionError::MissingEvidence("offload photo")));
    }

    #[test]
    fn completion_releases_escrow() {
        let mut b = booking(BookingStatus::Delivered, None);
        let evidence = EvidenceBundle::default();

        validate(&b, BookingStatus::Completed, &evidence).unwrap();
        apply_unchecked(&mut b, BookingStatus::Completed, &evidence, Utc::now());

        assert_eq!(b.status, BookingStatus::Completed);
        assert_eq!(b.payment_status, PaymentStatus::Released);
    }

    #[test]
    fn dispute_is_allowed_from_any_non_terminal_status() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Accepted,
            BookingStatus::InTransit,
            BookingStatus::Delivered,
        ] {
            let b = booking(status, None);
            assert_eq!(validate(&b, BookingStatus::Disputed, &EvidenceBundle::default()), Ok(()));
        }
    }

    #[test]
    fn terminal_booking_rejects_everything() {
        let completed = booking(BookingStatus::Completed, None);
        let err = validate(&completed, BookingStatus::Disputed, &EvidenceBundle::default());
        assert_eq!(err, Err(TransitionError::Terminal(BookingStatus::Completed)));

        let disputed = booking(BookingStatus::Disputed, None);
        let err = validate(&disputed, BookingStatus::Pending, &EvidenceBundle::default());
        assert_eq!(err, Err(TransitionError::Terminal(BookingStatus::Disputed)));
    }

    #[test]
    fn plain_forward_steps_need_no_evidence() {
        let b = booking(BookingStatus::Accepted, None);
        assert_eq!(
            validate(&b, BookingStatus::ArrivedAtPickup, &EvidenceBundle::default()),
            Ok(())
        );
    }
}
