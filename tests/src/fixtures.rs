//! Shared test fixtures.

use lc_crossing_contract::prelude::*;
use std::sync::Once;

static LOGGING: Once = Once::new();

/// Routes tracing output to the test harness (once per process).
pub fn init_logging() {
    LOGGING.call_once(lc_telemetry::init_test_logging);
}

// =============================================================================
// IDENTITIES
// =============================================================================

pub fn admin() -> StaticIdentity {
    StaticIdentity::infra_controller()
}

pub fn operator() -> StaticIdentity {
    StaticIdentity::railway_operator()
}

pub fn vehicle(plate: &str) -> StaticIdentity {
    StaticIdentity::vehicle(plate)
}

// =============================================================================
// SEEDING
// =============================================================================

/// Test service with logging routed to the harness.
pub fn service() -> CrossingService<ManualClock> {
    init_logging();
    create_test_service()
}

pub fn seed_crossing<K: Clock>(
    service: &CrossingService<K>,
    crossing_id: &str,
    status: CrossingStatus,
    validity_time: u64,
    lane_count: usize,
    lane_capacity: usize,
) {
    service
        .submit(
            &admin(),
            &Invocation::CreateCrossing {
                crossing_id: crossing_id.to_string(),
                status,
                validity_time,
                lane_count,
                lane_capacity,
            },
        )
        .expect("seed crossing");
}

pub fn seed_train<K: Clock>(service: &CrossingService<K>, train_id: &str, timeout: u64) {
    service
        .submit(
            &admin(),
            &Invocation::CreateTrain {
                train_id: train_id.to_string(),
                status: TrainStatus::Go,
                timeout,
            },
        )
        .expect("seed train");
}

// =============================================================================
// OPERATIONS
// =============================================================================

pub fn request_slot<K: Clock>(
    service: &CrossingService<K>,
    plate: &str,
    crossing_id: &str,
) -> Result<SlotAssignment, ContractError> {
    let result = service.submit(
        &vehicle(plate),
        &Invocation::RequestSlot {
            crossing_id: crossing_id.to_string(),
        },
    )?;
    Ok(result.as_slot().expect("slot result"))
}

pub fn release_slot<K: Clock>(
    service: &CrossingService<K>,
    plate: &str,
    crossing_id: &str,
    lane: i64,
    slot: i64,
) -> Result<(), ContractError> {
    service.submit(
        &vehicle(plate),
        &Invocation::ReleaseSlot {
            crossing_id: crossing_id.to_string(),
            lane,
            slot,
        },
    )?;
    Ok(())
}

pub fn request_crossing<K: Clock>(
    service: &CrossingService<K>,
    crossing_id: &str,
    train_id: &str,
) -> Result<ArbitrationOutcome, ContractError> {
    let result = service.submit(
        &operator(),
        &Invocation::RequestCrossing {
            crossing_id: crossing_id.to_string(),
            train_id: train_id.to_string(),
        },
    )?;
    Ok(result.as_outcome().expect("arbitration result"))
}

pub fn release_crossing<K: Clock>(
    service: &CrossingService<K>,
    crossing_id: &str,
    train_id: &str,
) -> Result<bool, ContractError> {
    let result = service.submit(
        &operator(),
        &Invocation::ReleaseCrossing {
            crossing_id: crossing_id.to_string(),
            train_id: train_id.to_string(),
        },
    )?;
    Ok(result.as_bool().expect("release result"))
}

pub fn read_crossing<K: Clock>(service: &CrossingService<K>, crossing_id: &str) -> Crossing {
    service
        .evaluate(
            &vehicle("READER"),
            &Invocation::ReadCrossing {
                crossing_id: crossing_id.to_string(),
            },
        )
        .expect("read crossing")
        .as_crossing()
        .cloned()
        .expect("crossing result")
}

pub fn read_train<K: Clock>(service: &CrossingService<K>, train_id: &str) -> Train {
    service
        .evaluate(
            &operator(),
            &Invocation::ReadTrain {
                train_id: train_id.to_string(),
            },
        )
        .expect("read train")
        .as_train()
        .cloned()
        .expect("train result")
}

// =============================================================================
// RAW STATE
// =============================================================================

/// Crossing as committed, without the lease rule.
pub fn stored_crossing(world: &WorldState, crossing_id: &str) -> Crossing {
    let bytes = world
        .get(&StateKey::public(crossing_id))
        .expect("crossing stored");
    serde_json::from_slice(&bytes).expect("crossing json")
}

pub fn stored_train(world: &WorldState, train_id: &str) -> Train {
    let bytes = world.get(&StateKey::public(train_id)).expect("train stored");
    serde_json::from_slice(&bytes).expect("train json")
}
