//! # Train Arbitration
//!
//! One deterministic step of the request/grant/deny protocol a train follows
//! to obtain exclusive use of a crossing, plus the matching release.
//!
//! Nothing here waits. A `Pending` outcome means the caller must invoke again
//! later; each call re-evaluates the crossing from scratch.
//!
//! A train's status is global while a crossing is one of many, so the crossing
//! records which train claimed or holds it. Only that train may finish the
//! claim or release the lock.
//!
//! ```text
//!   Go ──request──> Caution ──grid clear──> InCrossing ──release──> Go
//!    │                 │
//!    └──locked/claimed─┴──timed out──> Stop
//! ```

use crate::domain::entities::{Crossing, Train};
use crate::domain::value_objects::{ArbitrationOutcome, CrossingStatus, DenialReason, TrainStatus};

/// Outcome of a step plus which records the step modified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArbitrationStep {
    /// Protocol outcome reported to the caller.
    pub outcome: ArbitrationOutcome,
    /// The crossing view must be written back.
    pub crossing_changed: bool,
    /// The train must be written back.
    pub train_changed: bool,
}

/// Runs one `requestCrossing` step for `train_id`.
///
/// `crossing` must already have the lease-expiry rule applied. When the step
/// denies because the crossing is locked or claimed, only the train is marked
/// changed, so a lease-coerced view is never persisted.
pub fn request_crossing(
    crossing: &mut Crossing,
    train_id: &str,
    train: &mut Train,
    now: u64,
) -> ArbitrationStep {
    let refused = match crossing.status {
        CrossingStatus::Locked => Some(DenialReason::CrossingLocked),
        CrossingStatus::WillBeLocked
            if train.status != TrainStatus::Caution
                || crossing.holder.as_deref().is_some_and(|holder| holder != train_id) =>
        {
            Some(DenialReason::ClaimedByOtherTrain)
        }
        _ => None,
    };
    if let Some(reason) = refused {
        train.status = TrainStatus::Stop;
        return ArbitrationStep {
            outcome: ArbitrationOutcome::Denied(reason),
            crossing_changed: false,
            train_changed: true,
        };
    }

    if train.is_first_attempt() {
        train.time_of_request = Some(now);
    }

    if train.is_wait_exhausted(now) {
        crossing.status = CrossingStatus::FreeToCross;
        crossing.holder = None;
        train.status = TrainStatus::Stop;
        train.time_of_request = None;
        return ArbitrationStep {
            outcome: ArbitrationOutcome::Denied(DenialReason::TimedOut),
            crossing_changed: true,
            train_changed: true,
        };
    }

    crossing.status = CrossingStatus::WillBeLocked;
    crossing.holder = Some(train_id.to_string());
    train.status = TrainStatus::Caution;

    let outcome = if crossing.is_clear() {
        crossing.status = CrossingStatus::Locked;
        train.status = TrainStatus::InCrossing;
        ArbitrationOutcome::Granted
    } else {
        ArbitrationOutcome::Pending
    };

    ArbitrationStep {
        outcome,
        crossing_changed: true,
        train_changed: true,
    }
}

/// Releases `train_id`'s hold on a crossing.
///
/// Returns false (and changes nothing) unless the crossing is `Locked` with
/// `train_id` as its holder and the train is `InCrossing`.
pub fn release_crossing(crossing: &mut Crossing, train_id: &str, train: &mut Train) -> bool {
    if crossing.status != CrossingStatus::Locked
        || !crossing.is_held_by(train_id)
        || train.status != TrainStatus::InCrossing
    {
        return false;
    }
    crossing.status = CrossingStatus::FreeToCross;
    crossing.holder = None;
    train.status = TrainStatus::Go;
    train.time_of_request = None;
    true
}

// =============================================================================
// TESTS
// =============================================================================
