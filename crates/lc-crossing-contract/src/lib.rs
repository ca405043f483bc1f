//! # LC Crossing Contract - Level Crossing Arbitration
//!
//! **Status:** Reference implementation with in-memory ledger
//!
//! ## Purpose
//!
//! Arbitrates access to a railway level crossing between trains, which need
//! it exclusively, and road vehicles, which share it up to a fixed lane
//! capacity. Every operation is one atomic, deterministic ledger transaction;
//! nothing ever waits inside an invocation.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Grid Shape | `domain/invariants.rs` - `check_grid_shape_invariant()` |
//! | INVARIANT-2 | Single Cell Delta | `domain/invariants.rs` - `check_single_cell_delta_invariant()` |
//! | INVARIANT-3 | Mutual Exclusion | `domain/invariants.rs` - `check_mutual_exclusion_invariant()` |
//!
//! ## Lease Rule
//!
//! A crossing whose status is not `Locked` and whose `timeOfUpdate +
//! validityTime` has passed is treated as `Locked` by every reader. The
//! coercion is applied to the loaded view only and never written back.
//!
//! ## Access Policy
//!
//! | Operations | Organisation | Attribute |
//! |------------|--------------|-----------|
//! | create/update/delete crossing or train | railway | `role = infraController` |
//! | `readTrain`, `requestCrossing`, `releaseCrossing` | railway | none |
//! | `requestSlot`, `releaseSlot`, `readOccupancy` | vehicles | `licensePlate` |
//! | `crossingExists`, `trainExists`, `readCrossing` | any | none |
//!
//! ## Outbound Dependencies
//!
//! | Port | Purpose | Reference Adapter |
//! |------|---------|-------------------|
//! | `LedgerStub` | Public and private record access | `adapters::WorldState` |
//! | `ClientIdentity` | Caller organisation and attributes | `adapters::StaticIdentity` |
//! | `Clock` | Transaction timestamps | `adapters::SystemClock`, `adapters::ManualClock` |
//!
//! ## Usage Example
//!
//! ```ignore
//! use lc_crossing_contract::prelude::*;
//!
//! let service = create_test_service();
//! service.submit(&StaticIdentity::infra_controller(), &Invocation::CreateCrossing {
//!     crossing_id: "1001".into(),
//!     status: CrossingStatus::FreeToCross,
//!     validity_time: 1_000_000,
//!     lane_count: 2,
//!     lane_capacity: 2,
//! })?;
//!
//! let slot = service.submit(&StaticIdentity::vehicle("ABC-123"), &Invocation::RequestSlot {
//!     crossing_id: "1001".into(),
//! })?;
//! ```

// Crate-level lints
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod contract;
pub mod domain;
pub mod errors;
pub mod policy;
pub mod ports;
pub mod registry;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{Crossing, OccupancyRecord, Train};

    // Value objects
    pub use crate::domain::value_objects::{
        ArbitrationOutcome, CrossingStatus, DenialReason, EntityKind, SlotAssignment,
        SlotPosition, TrainStatus, DENIED_PAIR,
    };

    // Invariants
    pub use crate::domain::invariants::{
        check_all_invariants, check_mutual_exclusion_invariant, InvariantCheckResult,
        InvariantViolation,
    };

    // Ports
    pub use crate::ports::inbound::{CrossingContractApi, TxContext};
    pub use crate::ports::outbound::{ClientIdentity, Clock, LedgerStub};

    // Registry
    pub use crate::registry::{
        lookup, Invocation, InvocationResult, Mutability, OperationDescriptor, ResultType,
        OPERATIONS,
    };

    // Errors
    pub use crate::errors::{ContractError, LedgerError};

    // Configuration and policy
    pub use crate::config::ContractConfig;
    pub use crate::policy::{AccessPolicy, OperationClass};

    // Adapters
    pub use crate::adapters::{
        CommitReceipt, ManualClock, ReadWriteSet, StateKey, StaticIdentity, SystemClock,
        TxSimulation, WorldState,
    };

    // Contract and service
    pub use crate::contract::CrossingContract;
    pub use crate::service::{
        create_test_service, CrossingService, Endorsement, ServiceStats, TEST_GENESIS_TIME,
    };
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Contract name as deployed.
pub const CONTRACT_NAME: &str = "CrossingContract";

// =============================================================================
// TESTS
// =============================================================================
