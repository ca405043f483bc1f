//! # Driving Ports (API - Inbound)
//!
//! The operations the crossing contract exposes. Every operation runs inside
//! one transaction context and is one atomic, deterministic unit of work:
//! either all of its writes reach the ledger or none do.

use crate::domain::entities::{Crossing, OccupancyRecord, Train};
use crate::domain::value_objects::{
    ArbitrationOutcome, CrossingStatus, SlotAssignment, SlotPosition, TrainStatus,
};
use crate::errors::ContractError;
use crate::ports::outbound::{ClientIdentity, LedgerStub};

// =============================================================================
// TRANSACTION CONTEXT
// =============================================================================

/// Everything one invocation may touch: the ledger view and the caller.
pub struct TxContext<'a> {
    /// Ledger view scoped to this invocation.
    pub stub: &'a mut dyn LedgerStub,
    /// Verified caller identity.
    pub identity: &'a dyn ClientIdentity,
}

impl<'a> TxContext<'a> {
    /// Binds a ledger view and a caller.
    pub fn new(stub: &'a mut dyn LedgerStub, identity: &'a dyn ClientIdentity) -> Self {
        Self { stub, identity }
    }

    /// Transaction timestamp, read once per invocation.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.stub.tx_timestamp()
    }
}

// =============================================================================
// CROSSING CONTRACT API (Primary Driving Port)
// =============================================================================

/// Invocable operations of the level crossing contract.
///
/// ## Access
///
/// | Operations | Caller |
/// |------------|--------|
/// | `crossing_exists`, `train_exists`, `read_crossing` | anyone |
/// | create/update/delete | railway infrastructure controller |
/// | `read_train`, `request_crossing`, `release_crossing` | railway org |
/// | `request_slot`, `release_slot`, `read_occupancy` | vehicle with a license plate |
pub trait CrossingContractApi {
    // ----- Crossing administration -----

    /// Returns true if a crossing record exists under `crossing_id`.
    fn crossing_exists(&self, ctx: &mut TxContext<'_>, crossing_id: &str)
        -> Result<bool, ContractError>;

    /// Creates a crossing with an empty `lane_count` x `lane_capacity` grid.
    fn create_crossing(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
        status: CrossingStatus,
        validity_time: u64,
        lane_count: usize,
        lane_capacity: usize,
    ) -> Result<(), ContractError>;

    /// Reads a crossing with the lease-expiry rule applied to the returned view.
    fn read_crossing(&self, ctx: &mut TxContext<'_>, crossing_id: &str)
        -> Result<Crossing, ContractError>;

    /// Authoritative status write: new status, validity and `timeOfUpdate = now`.
    fn update_crossing(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
        status: CrossingStatus,
        validity_time: u64,
    ) -> Result<(), ContractError>;

    /// Removes a crossing record.
    fn delete_crossing(&self, ctx: &mut TxContext<'_>, crossing_id: &str)
        -> Result<(), ContractError>;

    // ----- Train administration -----

    /// Returns true if a train record exists under `train_id`.
    fn train_exists(&self, ctx: &mut TxContext<'_>, train_id: &str) -> Result<bool, ContractError>;

    /// Creates a train with no active request.
    fn create_train(
        &self,
        ctx: &mut TxContext<'_>,
        train_id: &str,
        status: TrainStatus,
        timeout: u64,
    ) -> Result<(), ContractError>;

    /// Reads a train record.
    fn read_train(&self, ctx: &mut TxContext<'_>, train_id: &str) -> Result<Train, ContractError>;

    /// Removes a train record.
    fn delete_train(&self, ctx: &mut TxContext<'_>, train_id: &str) -> Result<(), ContractError>;

    // ----- Train arbitration -----

    /// One step of a train's request for exclusive use of a crossing.
    fn request_crossing(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
        train_id: &str,
    ) -> Result<ArbitrationOutcome, ContractError>;

    /// Gives the crossing back. Returns false if the train did not hold it.
    fn release_crossing(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
        train_id: &str,
    ) -> Result<bool, ContractError>;

    // ----- Vehicle occupancy -----

    /// Claims a lane slot for the calling vehicle.
    fn request_slot(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
    ) -> Result<SlotAssignment, ContractError>;

    /// Frees a lane slot and marks the calling vehicle's record released.
    fn release_slot(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
        position: SlotPosition,
    ) -> Result<(), ContractError>;

    /// Reads back the calling vehicle's private occupancy record.
    fn read_occupancy(&self, ctx: &mut TxContext<'_>) -> Result<OccupancyRecord, ContractError>;
}
