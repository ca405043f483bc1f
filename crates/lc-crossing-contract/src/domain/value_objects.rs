//! # Value Objects
//!
//! Immutable domain primitives for crossing arbitration.
//! These types are defined by their value, not identity.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire sentinel returned when a vehicle is refused a slot.
pub const DENIED_PAIR: [i64; 2] = [-1, -1];

// =============================================================================
// CROSSING STATUS
// =============================================================================

/// Road-side status of a crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossingStatus {
    /// Open to road traffic.
    FreeToCross,
    /// Reserved for a train (or closed by the infrastructure).
    Locked,
    /// A train is acquiring the crossing; no new vehicles may enter.
    WillBeLocked,
}

impl CrossingStatus {
    /// Returns the persisted string literal.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FreeToCross => "FreeToCross",
            Self::Locked => "Locked",
            Self::WillBeLocked => "WillBeLocked",
        }
    }
}

impl fmt::Display for CrossingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TRAIN STATUS
// =============================================================================

/// Lifecycle status of a train with respect to a crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainStatus {
    /// Idle, no claim in flight.
    Go,
    /// Claim in flight, waiting for vehicles to clear.
    Caution,
    /// Exclusive hold granted.
    InCrossing,
    /// Claim denied or wait budget exhausted.
    Stop,
}

impl TrainStatus {
    /// Returns the persisted string literal.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Go => "Go",
            Self::Caution => "Caution",
            Self::InCrossing => "InCrossing",
            Self::Stop => "Stop",
        }
    }
}

impl fmt::Display for TrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ENTITY KIND
// =============================================================================

/// Kind of record addressed by an operation (used in error reporting).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Crossing record in the shared ledger.
    Crossing,
    /// Train record in the shared ledger.
    Train,
    /// Per-vehicle record in the private collection.
    Occupancy,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Crossing => "crossing",
            Self::Train => "train",
            Self::Occupancy => "occupancy record",
        })
    }
}

// =============================================================================
// SLOT POSITION
// =============================================================================

/// A cell in a crossing's lane grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotPosition {
    /// Lane index (row).
    pub lane: usize,
    /// Slot index within the lane (column).
    pub slot: usize,
}

impl SlotPosition {
    /// Creates a position.
    #[must_use]
    pub const fn new(lane: usize, slot: usize) -> Self {
        Self { lane, slot }
    }

    /// Converts caller-supplied wire coordinates. Returns None for negatives.
    #[must_use]
    pub fn from_wire(lane: i64, slot: i64) -> Option<Self> {
        let lane = usize::try_from(lane).ok()?;
        let slot = usize::try_from(slot).ok()?;
        Some(Self { lane, slot })
    }

    /// Returns the wire pair `[lane, slot]`.
    #[must_use]
    pub fn to_pair(self) -> [i64; 2] {
        [to_wire(self.lane), to_wire(self.slot)]
    }
}

impl fmt::Display for SlotPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lane, self.slot)
    }
}

pub(crate) fn to_wire(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

// =============================================================================
// SLOT ASSIGNMENT
// =============================================================================

/// Result of a vehicle slot request.
///
/// Serializes to `[lane, slot]` when assigned and `[-1, -1]` when denied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotAssignment {
    /// The vehicle holds this cell.
    Assigned(SlotPosition),
    /// Crossing not open, or every cell occupied.
    Denied,
}

impl SlotAssignment {
    /// Returns the wire pair.
    #[must_use]
    pub fn to_pair(self) -> [i64; 2] {
        match self {
            Self::Assigned(pos) => pos.to_pair(),
            Self::Denied => DENIED_PAIR,
        }
    }

    /// Returns the assigned position, if any.
    #[must_use]
    pub fn position(self) -> Option<SlotPosition> {
        match self {
            Self::Assigned(pos) => Some(pos),
            Self::Denied => None,
        }
    }

    /// Returns true if a slot was assigned.
    #[must_use]
    pub fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }
}

impl Serialize for SlotAssignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_pair().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SlotAssignment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [lane, slot] = <[i64; 2]>::deserialize(deserializer)?;
        if [lane, slot] == DENIED_PAIR {
            return Ok(Self::Denied);
        }
        SlotPosition::from_wire(lane, slot)
            .map(Self::Assigned)
            .ok_or_else(|| de::Error::custom(format!("invalid slot pair [{lane}, {slot}]")))
    }
}

// =============================================================================
// ARBITRATION OUTCOME
// =============================================================================

/// Why a train's request for a crossing was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    /// Crossing is locked (by another train, the infrastructure, or an expired lease).
    CrossingLocked,
    /// Another train is already acquiring the crossing.
    ClaimedByOtherTrain,
    /// The train's wait budget ran out before vehicles cleared.
    TimedOut,
}

/// Result of one `requestCrossing` step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArbitrationOutcome {
    /// Exclusive access held: crossing `Locked`, train `InCrossing`.
    Granted,
    /// Claim registered, vehicles still inside; the caller must retry.
    Pending,
    /// Claim refused; the train is now `Stop`.
    Denied(DenialReason),
}

impl ArbitrationOutcome {
    /// Returns true once the train holds the crossing.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Returns true if the caller should invoke again later.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

// =============================================================================
// TESTS
// =============================================================================
