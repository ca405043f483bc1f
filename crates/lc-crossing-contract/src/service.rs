//! # Crossing Service
//!
//! Wires the contract to a world state, a clock and callers. Each invocation
//! is simulated against committed state, then either discarded (evaluate) or
//! committed with MVCC validation (submit).
//!
//! ## Flow
//!
//! 1. `begin` a simulation stamped with the clock's current time
//! 2. Run the contract against it
//! 3. Evaluate: return the result, drop the writes
//! 4. Submit: commit the read/write set; a stale read fails with a retryable error

use crate::adapters::{ManualClock, ReadWriteSet, SystemClock, WorldState};
use crate::config::ContractConfig;
use crate::contract::CrossingContract;
use crate::errors::ContractError;
use crate::ports::inbound::TxContext;
use crate::ports::outbound::{ClientIdentity, Clock};
use crate::registry::{Invocation, InvocationResult};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, field, info, instrument, warn, Span};
use uuid::Uuid;

/// Start time of the manual clock used by `create_test_service`.
pub const TEST_GENESIS_TIME: u64 = 1_700_000_000;

/// Statistics for the Crossing Service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Simulations run.
    pub invocations: u64,
    /// Read-only results returned.
    pub evaluations: u64,
    /// Read/write sets committed.
    pub commits: u64,
    /// Invocations that returned an error.
    pub failures: u64,
    /// Rejected by the access policy.
    pub unauthorized: u64,
    /// Commits rejected by MVCC validation.
    pub mvcc_conflicts: u64,
}

/// A simulated invocation awaiting commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endorsement {
    /// Wire name of the simulated operation.
    pub operation: &'static str,
    /// Result the contract produced.
    pub result: InvocationResult,
    /// Reads and buffered writes.
    pub rwset: ReadWriteSet,
}

impl Endorsement {
    pub fn tx_id(&self) -> Uuid {
        self.rwset.tx_id
    }
}

/// The level crossing service.
pub struct CrossingService<K: Clock = SystemClock> {
    contract: CrossingContract,
    world: Arc<WorldState>,
    clock: K,
    stats: RwLock<ServiceStats>,
}

impl<K: Clock> CrossingService<K> {
    /// Create a new service over `world`.
    pub fn new(contract: CrossingContract, world: Arc<WorldState>, clock: K) -> Self {
        Self {
            contract,
            world,
            clock,
            stats: RwLock::new(ServiceStats::default()),
        }
    }

    pub fn contract(&self) -> &CrossingContract {
        &self.contract
    }

    pub fn world(&self) -> &Arc<WorldState> {
        &self.world
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Get current service statistics.
    pub fn stats(&self) -> ServiceStats {
        self.stats.read().clone()
    }

    /// Runs an invocation without committing anything.
    ///
    /// # Errors
    ///
    /// Whatever the contract returns for this invocation.
    #[instrument(skip(self, identity, invocation), fields(operation = invocation.name(), tx_id = field::Empty))]
    pub fn simulate(
        &self,
        identity: &dyn ClientIdentity,
        invocation: &Invocation,
    ) -> Result<Endorsement, ContractError> {
        let mut tx = self.world.begin(self.clock.now_secs());
        Span::current().record("tx_id", field::display(tx.tx_id()));

        let outcome = {
            let mut ctx = TxContext::new(&mut tx, identity);
            self.contract.invoke(&mut ctx, invocation)
        };

        let mut stats = self.stats.write();
        stats.invocations += 1;
        match outcome {
            Ok(result) => Ok(Endorsement {
                operation: invocation.name(),
                result,
                rwset: tx.into_rwset(),
            }),
            Err(err) => {
                stats.failures += 1;
                if matches!(err, ContractError::Unauthorized { .. }) {
                    stats.unauthorized += 1;
                }
                debug!(error = %err, "Invocation failed during simulation");
                Err(err)
            }
        }
    }

    /// Commits a simulated invocation.
    ///
    /// # Errors
    ///
    /// `Ledger(MvccConflict)` if a key it read changed since simulation.
    #[instrument(skip(self, endorsement), fields(operation = endorsement.operation, tx_id = %endorsement.tx_id()))]
    pub fn commit(&self, endorsement: Endorsement) -> Result<InvocationResult, ContractError> {
        match self.world.commit(&endorsement.rwset) {
            Ok(receipt) => {
                self.stats.write().commits += 1;
                info!(height = receipt.height, writes = receipt.writes, "Invocation committed");
                Ok(endorsement.result)
            }
            Err(err) => {
                let mut stats = self.stats.write();
                stats.failures += 1;
                if matches!(err, crate::errors::LedgerError::MvccConflict { .. }) {
                    stats.mvcc_conflicts += 1;
                }
                warn!(error = %err, "Commit rejected");
                Err(err.into())
            }
        }
    }

    /// Runs a query; writes, if any, are discarded.
    ///
    /// # Errors
    ///
    /// Whatever the contract returns for this invocation.
    pub fn evaluate(
        &self,
        identity: &dyn ClientIdentity,
        invocation: &Invocation,
    ) -> Result<InvocationResult, ContractError> {
        let endorsement = self.simulate(identity, invocation)?;
        if !endorsement.rwset.is_read_only() {
            debug!(
                operation = endorsement.operation,
                writes = endorsement.rwset.writes.len(),
                "Evaluated a mutating operation; writes discarded"
            );
        }
        self.stats.write().evaluations += 1;
        Ok(endorsement.result)
    }

    /// Simulates and commits.
    ///
    /// # Errors
    ///
    /// Contract errors from simulation, or ledger errors from commit.
    pub fn submit(
        &self,
        identity: &dyn ClientIdentity,
        invocation: &Invocation,
    ) -> Result<InvocationResult, ContractError> {
        let endorsement = self.simulate(identity, invocation)?;
        self.commit(endorsement)
    }

    /// Evaluates or submits according to the operation's registry entry.
    ///
    /// # Errors
    ///
    /// See `evaluate` and `submit`.
    pub fn invoke(
        &self,
        identity: &dyn ClientIdentity,
        invocation: &Invocation,
    ) -> Result<InvocationResult, ContractError> {
        if invocation.is_submit() {
            self.submit(identity, invocation)
        } else {
            self.evaluate(identity, invocation)
        }
    }

    /// Submits, resimulating after MVCC conflicts up to `max_attempts` times.
    ///
    /// # Errors
    ///
    /// The first non-retryable error, or the last conflict.
    pub fn submit_with_retry(
        &self,
        identity: &dyn ClientIdentity,
        invocation: &Invocation,
        max_attempts: usize,
    ) -> Result<InvocationResult, ContractError> {
        let mut attempt = 1;
        loop {
            match self.submit(identity, invocation) {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    debug!(attempt, error = %err, "Retrying after conflict");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

impl CrossingService<SystemClock> {
    /// Service on the wall clock with configuration from the environment.
    pub fn from_env(world: Arc<WorldState>) -> Self {
        Self::new(
            CrossingContract::new(ContractConfig::from_env()),
            world,
            SystemClock,
        )
    }
}

/// Service over an empty world state with a manual clock at `TEST_GENESIS_TIME`.
pub fn create_test_service() -> CrossingService<ManualClock> {
    CrossingService::new(
        CrossingContract::default(),
        Arc::new(WorldState::new()),
        ManualClock::new(TEST_GENESIS_TIME),
    )
}

// =============================================================================
// TESTS
// =============================================================================
