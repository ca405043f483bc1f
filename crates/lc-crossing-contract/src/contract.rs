//! # Crossing Contract
//!
//! Transaction orchestrator: authorizes the caller, loads the addressed
//! records, runs one domain transition and writes back only what changed.
//!
//! ## Record layout
//!
//! | Store | Key | Value |
//! |-------|-----|-------|
//! | public | crossing id | `Crossing` JSON |
//! | public | train id | `Train` JSON |
//! | private collection | license plate | `OccupancyRecord` JSON |
//!
//! Crossings and trains share one key space.

use crate::config::ContractConfig;
use crate::domain::arbitration;
use crate::domain::entities::{Crossing, OccupancyRecord, Train};
use crate::domain::invariants::check_grid_shape_invariant;
use crate::domain::occupancy;
use crate::domain::value_objects::{
    ArbitrationOutcome, CrossingStatus, EntityKind, SlotAssignment, SlotPosition, TrainStatus,
};
use crate::errors::ContractError;
use crate::policy::AccessPolicy;
use crate::ports::inbound::{CrossingContractApi, TxContext};
use crate::registry::{lookup, Invocation, InvocationResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

/// The level crossing contract.
#[derive(Clone, Debug, Default)]
pub struct CrossingContract {
    policy: AccessPolicy,
}

impl CrossingContract {
    /// Creates a contract bound to the given organisation configuration.
    #[must_use]
    pub fn new(config: ContractConfig) -> Self {
        Self {
            policy: AccessPolicy::new(config),
        }
    }

    /// Access policy in force.
    #[must_use]
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Dispatches a typed invocation.
    ///
    /// # Errors
    ///
    /// Whatever the dispatched operation returns.
    pub fn invoke(
        &self,
        ctx: &mut TxContext<'_>,
        invocation: &Invocation,
    ) -> Result<InvocationResult, ContractError> {
        let result = match invocation {
            Invocation::CrossingExists { crossing_id } => {
                InvocationResult::Bool(self.crossing_exists(ctx, crossing_id)?)
            }
            Invocation::TrainExists { train_id } => {
                InvocationResult::Bool(self.train_exists(ctx, train_id)?)
            }
            Invocation::CreateCrossing {
                crossing_id,
                status,
                validity_time,
                lane_count,
                lane_capacity,
            } => {
                self.create_crossing(
                    ctx,
                    crossing_id,
                    *status,
                    *validity_time,
                    *lane_count,
                    *lane_capacity,
                )?;
                InvocationResult::Unit
            }
            Invocation::ReadCrossing { crossing_id } => {
                InvocationResult::Crossing(self.read_crossing(ctx, crossing_id)?)
            }
            Invocation::UpdateCrossing {
                crossing_id,
                status,
                validity_time,
            } => {
                self.update_crossing(ctx, crossing_id, *status, *validity_time)?;
                InvocationResult::Unit
            }
            Invocation::DeleteCrossing { crossing_id } => {
                self.delete_crossing(ctx, crossing_id)?;
                InvocationResult::Unit
            }
            Invocation::CreateTrain {
                train_id,
                status,
                timeout,
            } => {
                self.create_train(ctx, train_id, *status, *timeout)?;
                InvocationResult::Unit
            }
            Invocation::ReadTrain { train_id } => {
                InvocationResult::Train(self.read_train(ctx, train_id)?)
            }
            Invocation::DeleteTrain { train_id } => {
                self.delete_train(ctx, train_id)?;
                InvocationResult::Unit
            }
            Invocation::RequestCrossing {
                crossing_id,
                train_id,
            } => InvocationResult::Outcome(self.request_crossing(ctx, crossing_id, train_id)?),
            Invocation::ReleaseCrossing {
                crossing_id,
                train_id,
            } => InvocationResult::Bool(self.release_crossing(ctx, crossing_id, train_id)?),
            Invocation::RequestSlot { crossing_id } => {
                InvocationResult::Slot(self.request_slot(ctx, crossing_id)?)
            }
            Invocation::ReleaseSlot {
                crossing_id,
                lane,
                slot,
            } => {
                let Some(position) = SlotPosition::from_wire(*lane, *slot) else {
                    self.guard_vehicle(ctx, invocation.name())?;
                    Self::load_crossing(ctx, crossing_id)?;
                    return Err(ContractError::InvalidPosition {
                        lane: *lane,
                        slot: *slot,
                    });
                };
                self.release_slot(ctx, crossing_id, position)?;
                InvocationResult::Unit
            }
            Invocation::ReadOccupancy => InvocationResult::Occupancy(self.read_occupancy(ctx)?),
        };
        Ok(result)
    }

    // =========================================================================
    // AUTHORIZATION
    // =========================================================================

    /// Checks the caller against the operation's policy row.
    fn guard(&self, ctx: &TxContext<'_>, operation: &str) -> Result<(), ContractError> {
        let descriptor = lookup(operation)
            .ok_or_else(|| ContractError::InvalidArgument(format!("unknown operation {operation}")))?;
        if self.policy.authorize(descriptor.class, ctx.identity) {
            return Ok(());
        }
        warn!(
            operation = descriptor.name,
            msp_id = ctx.identity.msp_id(),
            "Caller not authorized"
        );
        Err(ContractError::Unauthorized {
            operation: descriptor.name,
        })
    }

    /// Authorizes a vehicle operation and returns the caller's license plate.
    fn guard_vehicle(&self, ctx: &TxContext<'_>, operation: &str) -> Result<String, ContractError> {
        self.guard(ctx, operation)?;
        self.policy
            .vehicle_key(ctx.identity)
            .ok_or_else(|| ContractError::InvalidArgument("license plate missing".to_string()))
    }

    // =========================================================================
    // RECORD ACCESS
    // =========================================================================

    fn record_exists(ctx: &mut TxContext<'_>, key: &str) -> Result<bool, ContractError> {
        Ok(ctx.stub.get_state(key)?.is_some_and(|bytes| !bytes.is_empty()))
    }

    fn load<T: DeserializeOwned>(
        ctx: &mut TxContext<'_>,
        kind: EntityKind,
        key: &str,
    ) -> Result<T, ContractError> {
        match ctx.stub.get_state(key)? {
            Some(bytes) if !bytes.is_empty() => Ok(serde_json::from_slice(&bytes)?),
            _ => Err(ContractError::not_found(kind, key)),
        }
    }

    fn store<T: Serialize>(ctx: &mut TxContext<'_>, key: &str, record: &T) -> Result<(), ContractError> {
        ctx.stub.put_state(key, serde_json::to_vec(record)?)?;
        Ok(())
    }

    /// Stored crossing, without the lease rule.
    fn load_crossing(ctx: &mut TxContext<'_>, crossing_id: &str) -> Result<Crossing, ContractError> {
        let crossing: Crossing = Self::load(ctx, EntityKind::Crossing, crossing_id)?;
        if !check_grid_shape_invariant(&crossing) {
            return Err(ContractError::Serialization(format!(
                "crossing {crossing_id} has a malformed lane grid"
            )));
        }
        Ok(crossing)
    }

    /// Crossing as callers must see it at `now`.
    fn load_crossing_view(
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
    ) -> Result<Crossing, ContractError> {
        let now = ctx.now();
        let mut crossing = Self::load_crossing(ctx, crossing_id)?;
        if crossing.apply_lease_expiry(now) {
            debug!(
                crossing_id,
                time_of_update = crossing.time_of_update,
                validity_time = crossing.validity_time,
                "Open-status lease expired; treating crossing as locked"
            );
        }
        Ok(crossing)
    }

    fn load_train(ctx: &mut TxContext<'_>, train_id: &str) -> Result<Train, ContractError> {
        Self::load(ctx, EntityKind::Train, train_id)
    }

    fn store_occupancy(
        &self,
        ctx: &mut TxContext<'_>,
        plate: &str,
        record: OccupancyRecord,
    ) -> Result<(), ContractError> {
        let bytes = serde_json::to_vec(&record)?;
        ctx.stub
            .put_private_data(self.policy.private_collection(), plate, bytes)?;
        Ok(())
    }
}

impl CrossingContractApi for CrossingContract {
    // ===== CROSSING ADMINISTRATION =====

    fn crossing_exists(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
    ) -> Result<bool, ContractError> {
        self.guard(ctx, "crossingExists")?;
        Self::record_exists(ctx, crossing_id)
    }

    fn create_crossing(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
        status: CrossingStatus,
        validity_time: u64,
        lane_count: usize,
        lane_capacity: usize,
    ) -> Result<(), ContractError> {
        self.guard(ctx, "createCrossing")?;
        if Self::record_exists(ctx, crossing_id)? {
            return Err(ContractError::already_exists(EntityKind::Crossing, crossing_id));
        }

        let crossing = Crossing::new(status, validity_time, lane_count, lane_capacity, ctx.now())?;
        Self::store(ctx, crossing_id, &crossing)?;

        info!(
            crossing_id,
            %status,
            validity_time,
            lane_count,
            lane_capacity,
            "Crossing created"
        );
        Ok(())
    }

    fn read_crossing(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
    ) -> Result<Crossing, ContractError> {
        self.guard(ctx, "readCrossing")?;
        Self::load_crossing_view(ctx, crossing_id)
    }

    fn update_crossing(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
        status: CrossingStatus,
        validity_time: u64,
    ) -> Result<(), ContractError> {
        self.guard(ctx, "updateCrossing")?;
        let now = ctx.now();
        let mut crossing = Self::load_crossing(ctx, crossing_id)?;
        let previous = crossing.status;
        crossing.refresh(status, validity_time, now);
        Self::store(ctx, crossing_id, &crossing)?;

        info!(crossing_id, from = %previous, to = %status, validity_time, "Crossing status refreshed");
        Ok(())
    }

    fn delete_crossing(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
    ) -> Result<(), ContractError> {
        self.guard(ctx, "deleteCrossing")?;
        if !Self::record_exists(ctx, crossing_id)? {
            return Err(ContractError::not_found(EntityKind::Crossing, crossing_id));
        }
        ctx.stub.delete_state(crossing_id)?;

        info!(crossing_id, "Crossing deleted");
        Ok(())
    }

    // ===== TRAIN ADMINISTRATION =====

    fn train_exists(&self, ctx: &mut TxContext<'_>, train_id: &str) -> Result<bool, ContractError> {
        self.guard(ctx, "trainExists")?;
        Self::record_exists(ctx, train_id)
    }

    fn create_train(
        &self,
        ctx: &mut TxContext<'_>,
        train_id: &str,
        status: TrainStatus,
        timeout: u64,
    ) -> Result<(), ContractError> {
        self.guard(ctx, "createTrain")?;
        if Self::record_exists(ctx, train_id)? {
            return Err(ContractError::already_exists(EntityKind::Train, train_id));
        }
        Self::store(ctx, train_id, &Train::new(status, timeout))?;

        info!(train_id, %status, timeout, "Train created");
        Ok(())
    }

    fn read_train(&self, ctx: &mut TxContext<'_>, train_id: &str) -> Result<Train, ContractError> {
        self.guard(ctx, "readTrain")?;
        Self::load_train(ctx, train_id)
    }

    fn delete_train(&self, ctx: &mut TxContext<'_>, train_id: &str) -> Result<(), ContractError> {
        self.guard(ctx, "deleteTrain")?;
        if !Self::record_exists(ctx, train_id)? {
            return Err(ContractError::not_found(EntityKind::Train, train_id));
        }
        ctx.stub.delete_state(train_id)?;

        info!(train_id, "Train deleted");
        Ok(())
    }

    // ===== TRAIN ARBITRATION =====

    fn request_crossing(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
        train_id: &str,
    ) -> Result<ArbitrationOutcome, ContractError> {
        self.guard(ctx, "requestCrossing")?;
        let now = ctx.now();
        let mut crossing = Self::load_crossing_view(ctx, crossing_id)?;
        let mut train = Self::load_train(ctx, train_id)?;

        let step = arbitration::request_crossing(&mut crossing, train_id, &mut train, now);

        if step.crossing_changed {
            Self::store(ctx, crossing_id, &crossing)?;
        }
        if step.train_changed {
            Self::store(ctx, train_id, &train)?;
        }

        info!(
            crossing_id,
            train_id,
            outcome = ?step.outcome,
            crossing_status = %crossing.status,
            holder = crossing.holder.as_deref(),
            train_status = %train.status,
            "Crossing request evaluated"
        );
        Ok(step.outcome)
    }

    fn release_crossing(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
        train_id: &str,
    ) -> Result<bool, ContractError> {
        self.guard(ctx, "releaseCrossing")?;
        let mut crossing = Self::load_crossing_view(ctx, crossing_id)?;
        let mut train = Self::load_train(ctx, train_id)?;

        if !arbitration::release_crossing(&mut crossing, train_id, &mut train) {
            debug!(
                crossing_id,
                train_id,
                crossing_status = %crossing.status,
                holder = crossing.holder.as_deref(),
                train_status = %train.status,
                "Release ignored; train does not hold crossing"
            );
            return Ok(false);
        }
        Self::store(ctx, crossing_id, &crossing)?;
        Self::store(ctx, train_id, &train)?;

        info!(crossing_id, train_id, "Crossing released by train");
        Ok(true)
    }

    // ===== VEHICLE OCCUPANCY =====

    fn request_slot(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
    ) -> Result<SlotAssignment, ContractError> {
        let plate = self.guard_vehicle(ctx, "requestSlot")?;
        let mut crossing = Self::load_crossing_view(ctx, crossing_id)?;

        let assignment = occupancy::acquire_slot(&mut crossing)?;
        match assignment {
            SlotAssignment::Assigned(position) => {
                Self::store(ctx, crossing_id, &crossing)?;
                self.store_occupancy(ctx, &plate, OccupancyRecord::Occupying(position))?;
                info!(crossing_id, %position, "Slot assigned to vehicle");
            }
            SlotAssignment::Denied => {
                debug!(
                    crossing_id,
                    status = %crossing.status,
                    occupied = crossing.occupied_count(),
                    capacity = crossing.total_slots(),
                    "Slot request denied"
                );
            }
        }
        Ok(assignment)
    }

    fn release_slot(
        &self,
        ctx: &mut TxContext<'_>,
        crossing_id: &str,
        position: SlotPosition,
    ) -> Result<(), ContractError> {
        let plate = self.guard_vehicle(ctx, "releaseSlot")?;
        // Stored view: releasing must never persist a lease-coerced status.
        let mut crossing = Self::load_crossing(ctx, crossing_id)?;

        let record = occupancy::release_slot(&mut crossing, position)?;
        Self::store(ctx, crossing_id, &crossing)?;
        self.store_occupancy(ctx, &plate, record)?;

        info!(crossing_id, %position, "Slot released by vehicle");
        Ok(())
    }

    fn read_occupancy(&self, ctx: &mut TxContext<'_>) -> Result<OccupancyRecord, ContractError> {
        let plate = self.guard_vehicle(ctx, "readOccupancy")?;
        let bytes = ctx
            .stub
            .get_private_data(self.policy.private_collection(), &plate)?
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| ContractError::not_found(EntityKind::Occupancy, &plate))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

// =============================================================================
// TESTS
// =============================================================================
