use crate::lifecycle::policy;
use crate::models::action::OfflineAction;
use crate::models::booking::Booking;

/// Fold one booking's queued actions, in enqueue order, through the same
/// policy the authoritative store runs. Actions the policy rejects are
/// skipped, so the view never shows a state the store would refuse.
pub fn project_booking(mut booking: Booking, queue: &[OfflineAction]) -> Booking {
    for action in queue {
        if action.booking_id != booking.id {
            continue;
        }

        if policy::validate(&booking, action.target, &action.evidence).is_ok() {
            policy::apply_unchecked(&mut booking, action.target, &action.evidence, action.created_at);
        }
    }

    booking
}

/// The read model the driver view observes: the authoritative snapshot with
/// queued-but-unconfirmed deltas layered on top. Pure and idempotent; with
/// an empty queue it is the snapshot itself.
pub fn project(snapshot: Vec<Booking>, queue: &[OfflineAction]) -> Vec<Booking> {
    snapshot
        .into_iter()
        .map(|booking| project_booking(booking, queue))
        .collect()
}
