//! # Error Types
//!
//! All error types for the crossing contract and the ledger it runs against.

use crate::domain::value_objects::EntityKind;
use thiserror::Error;

// =============================================================================
// CONTRACT ERRORS
// =============================================================================

/// Errors surfaced to callers of contract operations.
///
/// Protocol denials (no free slot, crossing held by another train, wait budget
/// exhausted) are NOT errors; they are successful results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Addressed entity is absent.
    #[error("the {kind} {id} does not exist")]
    NotFound { kind: EntityKind, id: String },

    /// Creation collided with an existing record.
    #[error("the {kind} {id} already exists")]
    AlreadyExists { kind: EntityKind, id: String },

    /// Argument outside its accepted domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Lane position out of the grid or pointing at a free cell.
    #[error("invalid position given: [{lane}, {slot}]")]
    InvalidPosition { lane: i64, slot: i64 },

    /// Caller does not satisfy the operation's access policy.
    #[error("you do not have permission to execute {operation}")]
    Unauthorized { operation: &'static str },

    /// Failure reported by the ledger.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Stored bytes could not be decoded (or a value could not be encoded).
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ContractError {
    /// Returns true if resubmitting the same invocation may succeed.
    ///
    /// Only commit-time read conflicts qualify; every other failure is
    /// deterministic for the same ledger state.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::MvccConflict { .. }))
    }

    pub(crate) fn not_found(kind: EntityKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn already_exists(kind: EntityKind, id: &str) -> Self {
        Self::AlreadyExists {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Errors from the entity store adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A key read during simulation changed before commit.
    #[error("MVCC read conflict on key {key}")]
    MvccConflict { key: String },

    /// The transaction was already committed or discarded.
    #[error("transaction {tx_id} is closed")]
    TransactionClosed { tx_id: String },

    /// Ledger backend cannot serve the request.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// TESTS
// =============================================================================
