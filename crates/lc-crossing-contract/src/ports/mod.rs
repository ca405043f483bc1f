//! # Ports Layer (Hexagonal Architecture)
//!
//! Defines the interfaces between the crossing contract and the platform
//! hosting it.
//!
//! - **Inbound (Driving)**: `CrossingContractApi`, the invocable operations
//! - **Outbound (Driven)**: `LedgerStub`, `ClientIdentity`, `Clock`

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
