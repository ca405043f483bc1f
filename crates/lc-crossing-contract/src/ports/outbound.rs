//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the crossing contract depends on. The surrounding platform
//! supplies them:
//! - Ledger access for one transaction (`LedgerStub`)
//! - Caller identity and signed attributes (`ClientIdentity`)
//! - Wall clock for transaction timestamps (`Clock`)

use crate::errors::LedgerError;

// =============================================================================
// LEDGER STUB
// =============================================================================

/// Ledger view scoped to a single invocation.
///
/// Reads observe committed state; writes are buffered and only become visible
/// if the whole invocation commits. The adapter validates reads at commit time
/// (optimistic concurrency) and rejects the transaction on conflict.
pub trait LedgerStub {
    /// Transaction timestamp in seconds. Constant for the whole invocation.
    fn tx_timestamp(&self) -> u64;

    /// Read a public record.
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Write a public record.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Delete a public record.
    fn delete_state(&mut self, key: &str) -> Result<(), LedgerError>;

    /// Read a record from a private collection.
    fn get_private_data(
        &mut self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Write a record to a private collection.
    fn put_private_data(
        &mut self,
        collection: &str,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), LedgerError>;
}

// =============================================================================
// CLIENT IDENTITY
// =============================================================================

/// Verified identity of the invoking client.
///
/// Implementations expose attributes that were already authenticated by the
/// platform; the contract only evaluates them against its policy.
pub trait ClientIdentity: Send + Sync {
    /// Organisation (membership service provider) id.
    fn msp_id(&self) -> &str;

    /// Value of a signed attribute, if present.
    fn attribute_value(&self, name: &str) -> Option<String>;

    /// With `Some(expected)`: the attribute equals `expected`.
    /// With `None`: the attribute is present with a non-empty value.
    fn has_attribute(&self, name: &str, expected: Option<&str>) -> bool {
        match (self.attribute_value(name), expected) {
            (Some(value), Some(expected)) => value == expected,
            (Some(value), None) => !value.is_empty(),
            (None, _) => false,
        }
    }
}

// =============================================================================
// CLOCK
// =============================================================================

/// Source of transaction timestamps.
///
/// Read once when a transaction begins, never during execution.
pub trait Clock: Send + Sync {
    /// Current time in whole seconds since the Unix epoch.
    fn now_secs(&self) -> u64;
}

// =============================================================================
// TESTS
// =============================================================================
