//! # Vehicle Occupancy
//!
//! Capacity-bounded slot acquisition and release on a crossing's lane grid.
//! Each operation changes at most one cell.

use crate::domain::entities::{Crossing, OccupancyRecord};
use crate::domain::value_objects::{CrossingStatus, SlotAssignment, SlotPosition};
use crate::errors::ContractError;

/// Claims the first free cell (row-major) of an open crossing.
///
/// `crossing` must already have the lease-expiry rule applied. Returns
/// `Denied` without touching the grid if the crossing is not `FreeToCross`
/// or is full.
///
/// # Errors
///
/// `InvalidPosition` if the chosen cell cannot be occupied.
pub fn acquire_slot(crossing: &mut Crossing) -> Result<SlotAssignment, ContractError> {
    if crossing.status != CrossingStatus::FreeToCross {
        return Ok(SlotAssignment::Denied);
    }
    let Some(pos) = crossing.first_free_slot() else {
        return Ok(SlotAssignment::Denied);
    };
    crossing.occupy(pos)?;
    Ok(SlotAssignment::Assigned(pos))
}

/// Frees an occupied cell and returns the vehicle's terminal record.
///
/// # Errors
///
/// `InvalidPosition` if the cell is out of bounds or already free.
pub fn release_slot(crossing: &mut Crossing, pos: SlotPosition) -> Result<OccupancyRecord, ContractError> {
    crossing.vacate(pos)?;
    Ok(OccupancyRecord::Released(pos))
}

// =============================================================================
// TESTS
// =============================================================================
