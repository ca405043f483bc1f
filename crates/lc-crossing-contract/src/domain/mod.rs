//! # Domain Layer (Inner Hexagon)
//!
//! Pure crossing arbitration logic.
//! NO I/O, NO ledger access, NO clock reads: time is passed in.
//!
//! - Dependencies point INWARD only (contract and adapters depend on this).
//! - Every transition here is deterministic for the same inputs.

pub mod arbitration;
pub mod entities;
pub mod invariants;
pub mod occupancy;
pub mod value_objects;

pub use arbitration::*;
pub use entities::*;
pub use invariants::*;
pub use occupancy::*;
pub use value_objects::*;
