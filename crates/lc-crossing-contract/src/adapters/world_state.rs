//! In-memory World State Adapter
//!
//! Versioned key/value store with per-invocation transaction simulation and
//! optimistic-concurrency commit. Every key written in a block gets that
//! block's height as its version; a simulation records the version of every
//! key it reads and commit rejects it if any of them moved since.
//!
//! Committed transaction ids are remembered for `replay_window` blocks. A
//! simulation that began further back than that is rejected outright, so the
//! id set never outgrows the window.

use crate::errors::LedgerError;
use crate::ports::outbound::LedgerStub;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Address of a record in the world state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateKey {
    /// Record in the shared ledger.
    Public(String),
    /// Record in a private collection.
    Private { collection: String, key: String },
}

impl StateKey {
    pub fn public(key: &str) -> Self {
        Self::Public(key.to_string())
    }

    pub fn private(collection: &str, key: &str) -> Self {
        Self::Private {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public(key) => f.write_str(key),
            Self::Private { collection, key } => write!(f, "{collection}/{key}"),
        }
    }
}

#[derive(Clone, Debug)]
struct VersionedValue {
    value: Vec<u8>,
    version: u64,
}

/// Blocks a simulation may lag behind the head and still commit.
pub const DEFAULT_REPLAY_WINDOW: u64 = 4_096;

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<StateKey, VersionedValue>,
    height: u64,
    committed: HashSet<Uuid>,
    /// Commit height of every id in `committed`, oldest first.
    commit_log: VecDeque<(u64, Uuid)>,
}

impl Inner {
    fn remember(&mut self, tx_id: Uuid, window: u64) {
        self.committed.insert(tx_id);
        self.commit_log.push_back((self.height, tx_id));
        let horizon = self.height.saturating_sub(window);
        while let Some(&(height, old)) = self.commit_log.front() {
            if height > horizon {
                break;
            }
            self.commit_log.pop_front();
            self.committed.remove(&old);
        }
    }
}

/// Reads and buffered writes produced by simulating one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadWriteSet {
    /// Simulation that produced the set.
    pub tx_id: Uuid,
    /// Block height the simulation read from.
    pub begun_at: u64,
    /// Version observed for every key read (`None` = absent).
    pub reads: BTreeMap<StateKey, Option<u64>>,
    /// Buffered writes (`None` = delete).
    pub writes: BTreeMap<StateKey, Option<Vec<u8>>>,
}

impl ReadWriteSet {
    fn new(tx_id: Uuid, begun_at: u64) -> Self {
        Self {
            tx_id,
            begun_at,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Returns true if committing would change nothing.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Result of a successful commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    pub tx_id: Uuid,
    /// Block height the writes were committed at.
    pub height: u64,
    /// Number of keys written or deleted.
    pub writes: usize,
}

// =============================================================================
// WORLD STATE
// =============================================================================

/// In-memory ledger for tests and local runs.
#[derive(Debug)]
pub struct WorldState {
    inner: RwLock<Inner>,
    replay_window: u64,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::with_replay_window(DEFAULT_REPLAY_WINDOW)
    }
}

impl WorldState {
    /// Create an empty world state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty world state remembering commits for `window` blocks.
    pub fn with_replay_window(window: u64) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            replay_window: window.max(1),
        }
    }

    /// Starts simulating an invocation stamped with `timestamp`.
    pub fn begin(&self, timestamp: u64) -> TxSimulation<'_> {
        let tx_id = Uuid::new_v4();
        let begun_at = self.height();
        debug!(%tx_id, timestamp, begun_at, "Transaction simulation started");
        TxSimulation {
            world: self,
            timestamp,
            rwset: ReadWriteSet::new(tx_id, begun_at),
        }
    }

    /// Validates the read set and applies all writes, or none.
    ///
    /// # Errors
    ///
    /// - `TransactionClosed` if this simulation was already committed or
    ///   began more than `replay_window` blocks ago
    /// - `MvccConflict` if any key read changed after it was read
    pub fn commit(&self, rwset: &ReadWriteSet) -> Result<CommitReceipt, LedgerError> {
        let mut inner = self.inner.write();

        let lag = inner.height.saturating_sub(rwset.begun_at);
        if lag > self.replay_window || inner.committed.contains(&rwset.tx_id) {
            warn!(tx_id = %rwset.tx_id, lag, "Transaction closed");
            return Err(LedgerError::TransactionClosed {
                tx_id: rwset.tx_id.to_string(),
            });
        }

        for (key, observed) in &rwset.reads {
            let current = inner.records.get(key).map(|record| record.version);
            if current != *observed {
                warn!(tx_id = %rwset.tx_id, %key, ?observed, ?current, "MVCC read conflict");
                return Err(LedgerError::MvccConflict {
                    key: key.to_string(),
                });
            }
        }

        inner.height += 1;
        let height = inner.height;
        for (key, write) in &rwset.writes {
            match write {
                Some(value) => {
                    inner.records.insert(
                        key.clone(),
                        VersionedValue {
                            value: value.clone(),
                            version: height,
                        },
                    );
                }
                None => {
                    inner.records.remove(key);
                }
            }
        }
        inner.remember(rwset.tx_id, self.replay_window);

        debug!(tx_id = %rwset.tx_id, height, writes = rwset.writes.len(), "Transaction committed");
        Ok(CommitReceipt {
            tx_id: rwset.tx_id,
            height,
            writes: rwset.writes.len(),
        })
    }

    /// Current block height (number of commits).
    pub fn height(&self) -> u64 {
        self.inner.read().height
    }

    /// Committed value of a key, bypassing simulation.
    pub fn get(&self, key: &StateKey) -> Option<Vec<u8>> {
        self.inner.read().records.get(key).map(|record| record.value.clone())
    }

    /// Committed version of a key.
    pub fn version(&self, key: &StateKey) -> Option<u64> {
        self.inner.read().records.get(key).map(|record| record.version)
    }

    fn read(&self, key: &StateKey) -> Option<VersionedValue> {
        self.inner.read().records.get(key).cloned()
    }
}

// =============================================================================
// TRANSACTION SIMULATION
// =============================================================================

/// Ledger view for one invocation.
///
/// Reads always see committed state, never this simulation's own writes.
pub struct TxSimulation<'w> {
    world: &'w WorldState,
    timestamp: u64,
    rwset: ReadWriteSet,
}

impl TxSimulation<'_> {
    pub fn tx_id(&self) -> Uuid {
        self.rwset.tx_id
    }

    /// Ends the simulation, yielding what it read and wrote.
    pub fn into_rwset(self) -> ReadWriteSet {
        self.rwset
    }

    fn read(&mut self, key: StateKey) -> Option<Vec<u8>> {
        let record = self.world.read(&key);
        self.rwset
            .reads
            .entry(key)
            .or_insert_with(|| record.as_ref().map(|r| r.version));
        record.map(|r| r.value)
    }
}

impl LedgerStub for TxSimulation<'_> {
    fn tx_timestamp(&self) -> u64 {
        self.timestamp
    }

    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.read(StateKey::public(key)))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        self.rwset.writes.insert(StateKey::public(key), Some(value));
        Ok(())
    }

    fn delete_state(&mut self, key: &str) -> Result<(), LedgerError> {
        self.rwset.writes.insert(StateKey::public(key), None);
        Ok(())
    }

    fn get_private_data(
        &mut self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.read(StateKey::private(collection, key)))
    }

    fn put_private_data(
        &mut self,
        collection: &str,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), LedgerError> {
        self.rwset
            .writes
            .insert(StateKey::private(collection, key), Some(value));
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
