//! Cross-component scenarios run against the full service stack.

pub mod concurrency;
pub mod invariants;
