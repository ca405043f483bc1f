//! # Core Domain Entities
//!
//! Records persisted by the crossing contract:
//! - `Crossing`: status, lease timestamps and the lane occupancy grid
//! - `Train`: arbitration lifecycle fields
//! - `OccupancyRecord`: a vehicle's private position record

use crate::domain::value_objects::{to_wire, CrossingStatus, SlotPosition, TrainStatus};
use crate::errors::ContractError;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

// =============================================================================
// CROSSING
// =============================================================================

/// A level crossing.
///
/// `lanes` is an L x C grid where `true` marks an occupied slot. The shape is
/// fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crossing {
    /// Current status.
    pub status: CrossingStatus,
    /// Seconds timestamp of the last authoritative status write.
    pub time_of_update: u64,
    /// Seconds during which a `FreeToCross` status stays trustworthy.
    pub validity_time: u64,
    /// Lane occupancy grid.
    pub lanes: Vec<Vec<bool>>,
    /// Train that claimed (`WillBeLocked`) or holds (`Locked`) the crossing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
}

impl Crossing {
    /// Creates a crossing with an empty `lane_count` x `lane_capacity` grid.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if either dimension is zero.
    pub fn new(
        status: CrossingStatus,
        validity_time: u64,
        lane_count: usize,
        lane_capacity: usize,
        now: u64,
    ) -> Result<Self, ContractError> {
        if lane_count == 0 {
            return Err(ContractError::InvalidArgument(
                "at least 1 lane is needed".to_string(),
            ));
        }
        if lane_capacity == 0 {
            return Err(ContractError::InvalidArgument(
                "lane capacity should be at least 1".to_string(),
            ));
        }

        Ok(Self {
            status,
            time_of_update: now,
            validity_time,
            lanes: vec![vec![false; lane_capacity]; lane_count],
            holder: None,
        })
    }

    /// Number of lanes.
    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Slots per lane.
    #[must_use]
    pub fn lane_capacity(&self) -> usize {
        self.lanes.first().map_or(0, Vec::len)
    }

    /// Total number of slots in the grid.
    #[must_use]
    pub fn total_slots(&self) -> usize {
        self.lanes.iter().map(Vec::len).sum()
    }

    /// Instant at which a `FreeToCross` status stops being trusted.
    #[must_use]
    pub fn lease_expires_at(&self) -> u64 {
        self.time_of_update.saturating_add(self.validity_time)
    }

    /// Returns true if the open-status lease has elapsed at `now`.
    #[must_use]
    pub fn is_lease_expired(&self, now: u64) -> bool {
        now >= self.lease_expires_at()
    }

    /// Coerces a stale non-`Locked` status to `Locked` in this view.
    ///
    /// Returns true if the status was coerced. The caller decides whether the
    /// coerced view is ever written back.
    pub fn apply_lease_expiry(&mut self, now: u64) -> bool {
        if self.status != CrossingStatus::Locked && self.is_lease_expired(now) {
            self.status = CrossingStatus::Locked;
            return true;
        }
        false
    }

    /// Authoritative status write from the infrastructure.
    ///
    /// Any train claim ends unless the crossing stays `Locked`.
    pub fn refresh(&mut self, status: CrossingStatus, validity_time: u64, now: u64) {
        if status != CrossingStatus::Locked {
            self.holder = None;
        }
        self.status = status;
        self.time_of_update = now;
        self.validity_time = validity_time;
    }

    /// Returns true if `train_id` is the recorded holder.
    #[must_use]
    pub fn is_held_by(&self, train_id: &str) -> bool {
        self.holder.as_deref() == Some(train_id)
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.lanes.iter().flatten().filter(|occupied| **occupied).count()
    }

    /// Returns true if no vehicle occupies the crossing.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.occupied_count() == 0
    }

    /// First free slot in row-major order.
    #[must_use]
    pub fn first_free_slot(&self) -> Option<SlotPosition> {
        self.lanes.iter().enumerate().find_map(|(lane, slots)| {
            slots
                .iter()
                .position(|occupied| !occupied)
                .map(|slot| SlotPosition::new(lane, slot))
        })
    }

    /// Occupancy of a cell, or None if it lies outside the grid.
    #[must_use]
    pub fn is_occupied(&self, pos: SlotPosition) -> Option<bool> {
        self.lanes.get(pos.lane)?.get(pos.slot).copied()
    }

    /// Marks a free cell occupied.
    ///
    /// # Errors
    ///
    /// `InvalidPosition` if the cell is out of bounds or already occupied.
    pub fn occupy(&mut self, pos: SlotPosition) -> Result<(), ContractError> {
        match self.cell_mut(pos) {
            Some(cell) if !*cell => {
                *cell = true;
                Ok(())
            }
            _ => Err(invalid_position(pos)),
        }
    }

    /// Marks an occupied cell free.
    ///
    /// # Errors
    ///
    /// `InvalidPosition` if the cell is out of bounds or already free.
    pub fn vacate(&mut self, pos: SlotPosition) -> Result<(), ContractError> {
        match self.cell_mut(pos) {
            Some(cell) if *cell => {
                *cell = false;
                Ok(())
            }
            _ => Err(invalid_position(pos)),
        }
    }

    fn cell_mut(&mut self, pos: SlotPosition) -> Option<&mut bool> {
        self.lanes.get_mut(pos.lane)?.get_mut(pos.slot)
    }
}

fn invalid_position(pos: SlotPosition) -> ContractError {
    ContractError::InvalidPosition {
        lane: to_wire(pos.lane),
        slot: to_wire(pos.slot),
    }
}

// =============================================================================
// TRAIN
// =============================================================================

/// A train taking part in crossing arbitration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    /// Current lifecycle status.
    pub status: TrainStatus,
    /// Start of the current request attempt; persisted as `-1` when unset.
    #[serde(with = "request_time")]
    pub time_of_request: Option<u64>,
    /// Seconds the train is willing to wait for exclusive access.
    pub timeout: u64,
}

impl Train {
    /// Creates a train with no active request.
    #[must_use]
    pub fn new(status: TrainStatus, timeout: u64) -> Self {
        Self {
            status,
            time_of_request: None,
            timeout,
        }
    }

    /// Returns true if this call starts a new request attempt.
    #[must_use]
    pub fn is_first_attempt(&self) -> bool {
        self.time_of_request.is_none() || self.status == TrainStatus::Go
    }

    /// Instant at which the current attempt gives up, if one is active.
    #[must_use]
    pub fn wait_deadline(&self) -> Option<u64> {
        self.time_of_request
            .map(|started| started.saturating_add(self.timeout))
    }

    /// Returns true if the current attempt's wait budget is spent at `now`.
    #[must_use]
    pub fn is_wait_exhausted(&self, now: u64) -> bool {
        self.wait_deadline().is_some_and(|deadline| now >= deadline)
    }
}

/// `Option<u64>` <-> integer with `-1` meaning "no active request".
mod request_time {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(secs) => serializer.serialize_u64(*secs),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(u64::try_from(raw).ok())
    }
}

// =============================================================================
// OCCUPANCY RECORD
// =============================================================================

/// A vehicle's entry in the private collection, keyed by license plate.
///
/// Serializes to `[lane, slot]` while occupying and `[lane, slot, -1]` once
/// released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OccupancyRecord {
    /// Vehicle currently holds this cell.
    Occupying(SlotPosition),
    /// Vehicle left this cell.
    Released(SlotPosition),
}

impl OccupancyRecord {
    /// Cell the record refers to.
    #[must_use]
    pub fn position(&self) -> SlotPosition {
        match self {
            Self::Occupying(pos) | Self::Released(pos) => *pos,
        }
    }

    /// Returns true while the vehicle is inside the crossing.
    #[must_use]
    pub fn is_occupying(&self) -> bool {
        matches!(self, Self::Occupying(_))
    }
}

impl Serialize for OccupancyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let [lane, slot] = self.position().to_pair();
        match self {
            Self::Occupying(_) => [lane, slot].serialize(serializer),
            Self::Released(_) => [lane, slot, -1].serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for OccupancyRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<i64>::deserialize(deserializer)?;
        let position = |lane: i64, slot: i64| {
            SlotPosition::from_wire(lane, slot)
                .ok_or_else(|| de::Error::custom(format!("invalid position [{lane}, {slot}]")))
        };
        match raw.as_slice() {
            [lane, slot] => position(*lane, *slot).map(Self::Occupying),
            [lane, slot, -1] => position(*lane, *slot).map(Self::Released),
            other => Err(de::Error::custom(format!(
                "malformed occupancy record {other:?}"
            ))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
