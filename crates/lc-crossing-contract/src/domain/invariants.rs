//! # Domain Invariants
//!
//! Safety properties that MUST hold for every reachable ledger state.
//!
//! - INVARIANT-1: Grid Shape (non-empty, rectangular)
//! - INVARIANT-2: Single Cell Delta (a vehicle operation flips at most one cell)
//! - INVARIANT-3: Mutual Exclusion (a train in the crossing holds it alone)

use crate::domain::entities::{Crossing, Train};
use crate::domain::value_objects::{CrossingStatus, TrainStatus};
use std::fmt;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// INVARIANT-1: Grid Shape
///
/// At least one lane, every lane with the same non-zero capacity.
#[must_use]
pub fn check_grid_shape_invariant(crossing: &Crossing) -> bool {
    let capacity = crossing.lane_capacity();
    capacity > 0 && crossing.lanes.iter().all(|lane| lane.len() == capacity)
}

/// INVARIANT-2: Single Cell Delta
///
/// Between two views of the same crossing, the grid shape is unchanged and
/// at most one cell differs.
#[must_use]
pub fn check_single_cell_delta_invariant(before: &Crossing, after: &Crossing) -> bool {
    if before.lane_count() != after.lane_count()
        || before
            .lanes
            .iter()
            .zip(&after.lanes)
            .any(|(a, b)| a.len() != b.len())
    {
        return false;
    }
    let changed = before
        .lanes
        .iter()
        .flatten()
        .zip(after.lanes.iter().flatten())
        .filter(|(a, b)| a != b)
        .count();
    changed <= 1
}

/// INVARIANT-3: Mutual Exclusion
///
/// For the trains arbitrating on `crossing` (stored, not lease-coerced view):
/// at most one is `InCrossing`, and if one is, the crossing is `Locked` with
/// no vehicle inside.
#[must_use]
pub fn check_mutual_exclusion_invariant(crossing: &Crossing, trains: &[Train]) -> bool {
    let holders = trains
        .iter()
        .filter(|train| train.status == TrainStatus::InCrossing)
        .count();
    match holders {
        0 => true,
        1 => crossing.status == CrossingStatus::Locked && crossing.is_clear(),
        _ => false,
    }
}

/// Check all state invariants of a crossing and its trains at once.
#[must_use]
pub fn check_all_invariants(crossing: &Crossing, trains: &[Train]) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_grid_shape_invariant(crossing) {
        violations.push(InvariantViolation::MalformedGrid {
            lanes: crossing.lane_count(),
        });
    }

    if !check_mutual_exclusion_invariant(crossing, trains) {
        violations.push(InvariantViolation::ExclusionBroken {
            holders: trains
                .iter()
                .filter(|t| t.status == TrainStatus::InCrossing)
                .count(),
            crossing_status: crossing.status,
            occupied: crossing.occupied_count(),
        });
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Grid empty or ragged.
    MalformedGrid { lanes: usize },
    /// A vehicle operation changed more than one cell or reshaped the grid.
    MultiCellDelta,
    /// Train exclusivity broken.
    ExclusionBroken {
        holders: usize,
        crossing_status: CrossingStatus,
        occupied: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedGrid { lanes } => {
                write!(f, "malformed lane grid ({lanes} lanes)")
            }
            Self::MultiCellDelta => {
                write!(f, "vehicle operation changed more than one cell")
            }
            Self::ExclusionBroken {
                holders,
                crossing_status,
                occupied,
            } => write!(
                f,
                "mutual exclusion broken: {holders} trains in crossing, status {crossing_status}, {occupied} vehicles"
            ),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
