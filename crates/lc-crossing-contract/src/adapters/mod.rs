//! # Adapters Layer
//!
//! Reference implementations of the outbound ports.
//!
//! - `WorldState`: in-memory versioned ledger with MVCC commit
//! - `StaticIdentity`: fixed caller identity
//! - `SystemClock` / `ManualClock`: transaction timestamps

pub mod clock;
pub mod identity;
pub mod world_state;

pub use clock::{ManualClock, SystemClock};
pub use identity::StaticIdentity;
pub use world_state::{
    CommitReceipt, ReadWriteSet, StateKey, TxSimulation, WorldState, DEFAULT_REPLAY_WINDOW,
};
