//! # Operation Registry
//!
//! Static table describing every invocable operation: wire name, whether it
//! commits, declared result type and access class. `Invocation` is the typed
//! form of a call; the service dispatches on it and consults its descriptor
//! to decide between evaluate and submit.

use crate::domain::entities::{Crossing, OccupancyRecord, Train};
use crate::domain::value_objects::{ArbitrationOutcome, CrossingStatus, SlotAssignment, TrainStatus};
use crate::policy::OperationClass;
use serde::{Deserialize, Serialize};

// =============================================================================
// DESCRIPTORS
// =============================================================================

/// Whether an operation's writes are committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// Read-only; simulated and discarded.
    Evaluate,
    /// Mutating; simulated then committed.
    Submit,
}

/// Declared result of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultType {
    Bool,
    Unit,
    Crossing,
    Train,
    Outcome,
    Slot,
    Occupancy,
}

/// Registry entry for one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Wire name.
    pub name: &'static str,
    pub mutability: Mutability,
    pub result: ResultType,
    /// Policy row the caller is checked against.
    pub class: OperationClass,
}

const fn op(
    name: &'static str,
    mutability: Mutability,
    result: ResultType,
    class: OperationClass,
) -> OperationDescriptor {
    OperationDescriptor {
        name,
        mutability,
        result,
        class,
    }
}

/// Every operation the contract exposes.
pub static OPERATIONS: [OperationDescriptor; 14] = [
    op("crossingExists", Mutability::Evaluate, ResultType::Bool, OperationClass::Public),
    op("trainExists", Mutability::Evaluate, ResultType::Bool, OperationClass::Public),
    op("createCrossing", Mutability::Submit, ResultType::Unit, OperationClass::InfraAdministration),
    op("readCrossing", Mutability::Evaluate, ResultType::Crossing, OperationClass::Public),
    op("updateCrossing", Mutability::Submit, ResultType::Unit, OperationClass::InfraAdministration),
    op("deleteCrossing", Mutability::Submit, ResultType::Unit, OperationClass::InfraAdministration),
    op("createTrain", Mutability::Submit, ResultType::Unit, OperationClass::InfraAdministration),
    op("readTrain", Mutability::Evaluate, ResultType::Train, OperationClass::RailwayRead),
    op("deleteTrain", Mutability::Submit, ResultType::Unit, OperationClass::InfraAdministration),
    op("requestCrossing", Mutability::Submit, ResultType::Outcome, OperationClass::TrainArbitration),
    op("releaseCrossing", Mutability::Submit, ResultType::Bool, OperationClass::TrainArbitration),
    op("requestSlot", Mutability::Submit, ResultType::Slot, OperationClass::VehicleOccupancy),
    op("releaseSlot", Mutability::Submit, ResultType::Unit, OperationClass::VehicleOccupancy),
    op("readOccupancy", Mutability::Evaluate, ResultType::Occupancy, OperationClass::VehicleOccupancy),
];

/// Looks up an operation by wire name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static OperationDescriptor> {
    OPERATIONS.iter().find(|descriptor| descriptor.name == name)
}

// =============================================================================
// INVOCATIONS
// =============================================================================

/// A typed call with its arguments.
///
/// Deserializes from `{"operation": "<name>", ...args}` with camelCase
/// argument names. `ReleaseSlot` carries raw wire coordinates; negative values
/// are rejected as `InvalidPosition` when the call is dispatched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Invocation {
    CrossingExists {
        crossing_id: String,
    },
    TrainExists {
        train_id: String,
    },
    CreateCrossing {
        crossing_id: String,
        status: CrossingStatus,
        validity_time: u64,
        lane_count: usize,
        lane_capacity: usize,
    },
    ReadCrossing {
        crossing_id: String,
    },
    UpdateCrossing {
        crossing_id: String,
        status: CrossingStatus,
        validity_time: u64,
    },
    DeleteCrossing {
        crossing_id: String,
    },
    CreateTrain {
        train_id: String,
        status: TrainStatus,
        timeout: u64,
    },
    ReadTrain {
        train_id: String,
    },
    DeleteTrain {
        train_id: String,
    },
    RequestCrossing {
        crossing_id: String,
        train_id: String,
    },
    ReleaseCrossing {
        crossing_id: String,
        train_id: String,
    },
    RequestSlot {
        crossing_id: String,
    },
    ReleaseSlot {
        crossing_id: String,
        lane: i64,
        slot: i64,
    },
    ReadOccupancy,
}

impl Invocation {
    /// Registry entry for this call.
    #[must_use]
    pub fn descriptor(&self) -> &'static OperationDescriptor {
        let index = match self {
            Self::CrossingExists { .. } => 0,
            Self::TrainExists { .. } => 1,
            Self::CreateCrossing { .. } => 2,
            Self::ReadCrossing { .. } => 3,
            Self::UpdateCrossing { .. } => 4,
            Self::DeleteCrossing { .. } => 5,
            Self::CreateTrain { .. } => 6,
            Self::ReadTrain { .. } => 7,
            Self::DeleteTrain { .. } => 8,
            Self::RequestCrossing { .. } => 9,
            Self::ReleaseCrossing { .. } => 10,
            Self::RequestSlot { .. } => 11,
            Self::ReleaseSlot { .. } => 12,
            Self::ReadOccupancy => 13,
        };
        &OPERATIONS[index]
    }

    /// Wire name of the operation.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Returns true if the call's writes must be committed.
    #[must_use]
    pub fn is_submit(&self) -> bool {
        self.descriptor().mutability == Mutability::Submit
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Value returned by a dispatched invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InvocationResult {
    Bool(bool),
    Unit,
    Crossing(Crossing),
    Train(Train),
    Outcome(ArbitrationOutcome),
    Slot(SlotAssignment),
    Occupancy(OccupancyRecord),
}

impl InvocationResult {
    /// Declared type of this value.
    #[must_use]
    pub fn result_type(&self) -> ResultType {
        match self {
            Self::Bool(_) => ResultType::Bool,
            Self::Unit => ResultType::Unit,
            Self::Crossing(_) => ResultType::Crossing,
            Self::Train(_) => ResultType::Train,
            Self::Outcome(_) => ResultType::Outcome,
            Self::Slot(_) => ResultType::Slot,
            Self::Occupancy(_) => ResultType::Occupancy,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_crossing(&self) -> Option<&Crossing> {
        match self {
            Self::Crossing(crossing) => Some(crossing),
            _ => None,
        }
    }

    pub fn as_train(&self) -> Option<&Train> {
        match self {
            Self::Train(train) => Some(train),
            _ => None,
        }
    }

    pub fn as_outcome(&self) -> Option<ArbitrationOutcome> {
        match self {
            Self::Outcome(outcome) => Some(*outcome),
            _ => None,
        }
    }

    pub fn as_slot(&self) -> Option<SlotAssignment> {
        match self {
            Self::Slot(slot) => Some(*slot),
            _ => None,
        }
    }

    pub fn as_occupancy(&self) -> Option<OccupancyRecord> {
        match self {
            Self::Occupancy(record) => Some(*record),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
