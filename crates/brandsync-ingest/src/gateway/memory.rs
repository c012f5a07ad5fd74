//! In-memory gateway used by tests and dry runs without a database
//!
//! Rows are unique per key. Writes go to a staged copy of the committed
//! rows, so lookups see uncommitted writes of the open unit.

use async_trait::async_trait;
use brandsync_common::{CanonicalRecord, RecordKey};
use std::collections::{BTreeMap, HashSet};

use super::{Lookup, PersistenceGateway};
use crate::error::GatewayError;

/// A write that reached the staged state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Insert { key: RecordKey, category: String },
    Update { key: RecordKey, category: String },
}

type Rows = BTreeMap<RecordKey, Option<String>>;

#[derive(Debug, Default)]
pub struct MemoryGateway {
    committed: Rows,
    staged: Option<Rows>,
    writes: Vec<WriteOp>,
    failing_lookups: HashSet<RecordKey>,
    failing_writes: HashSet<RecordKey>,
    fail_next_commit: bool,
    commits: usize,
    rollbacks: usize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from committed rows; `None` models a NULL category
    pub fn with_rows<I, K>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<&'static str>)>,
        K: Into<RecordKey>,
    {
        let mut gateway = Self::new();
        for (key, category) in rows {
            gateway.seed(key.into(), category);
        }
        gateway
    }

    /// Add a committed row directly
    pub fn seed(&mut self, key: RecordKey, category: Option<&str>) {
        self.committed.insert(key, category.map(str::to_string));
    }

    /// Make every lookup of `key` fail
    pub fn fail_lookup_for(&mut self, key: RecordKey) {
        self.failing_lookups.insert(key);
    }

    /// Make every insert or update of `key` fail
    pub fn fail_writes_for(&mut self, key: RecordKey) {
        self.failing_writes.insert(key);
    }

    /// Make the next commit fail and discard its staged writes
    pub fn fail_next_commit(&mut self) {
        self.fail_next_commit = true;
    }

    /// Committed category of `key`: `None` when absent, `Some(None)` when NULL
    pub fn category(&self, key: &RecordKey) -> Option<Option<&str>> {
        self.committed.get(key).map(Option::as_deref)
    }

    /// Number of committed rows
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Every staged write so far, including ones later rolled back
    pub fn writes(&self) -> &[WriteOp] {
        &self.writes
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn rollback_count(&self) -> usize {
        self.rollbacks
    }

    fn working(&mut self) -> &mut Rows {
        self.staged.get_or_insert_with(|| self.committed.clone())
    }

    fn visible(&self) -> &Rows {
        self.staged.as_ref().unwrap_or(&self.committed)
    }

    fn check_write(&self, key: &RecordKey) -> Result<(), GatewayError> {
        if self.failing_writes.contains(key) {
            return Err(GatewayError::Injected(format!("write rejected for {}", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn lookup_category(&mut self, key: &RecordKey) -> Result<Lookup, GatewayError> {
        if self.failing_lookups.contains(key) {
            return Err(GatewayError::Injected(format!("lookup failed for {}", key)));
        }
        Ok(match self.visible().get(key) {
            Some(category) => Lookup::Found(category.clone()),
            None => Lookup::NotFound,
        })
    }

    async fn insert_record(&mut self, record: &CanonicalRecord) -> Result<(), GatewayError> {
        let key = record.key();
        self.check_write(&key)?;
        if self.visible().contains_key(&key) {
            return Err(GatewayError::Injected(format!("duplicate key {}", key)));
        }

        self.working().insert(key.clone(), Some(record.category.clone()));
        self.writes.push(WriteOp::Insert {
            key,
            category: record.category.clone(),
        });
        Ok(())
    }

    async fn update_category(&mut self, key: &RecordKey, category: &str) -> Result<(), GatewayError> {
        self.check_write(key)?;
        if let Some(existing) = self.working().get_mut(key) {
            *existing = Some(category.to_string());
        }
        self.writes.push(WriteOp::Update {
            key: key.clone(),
            category: category.to_string(),
        });
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), GatewayError> {
        let staged = self.staged.take();
        if self.fail_next_commit {
            self.fail_next_commit = false;
            return Err(GatewayError::Injected("commit rejected".to_string()));
        }
        if let Some(rows) = staged {
            self.committed = rows;
        }
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), GatewayError> {
        self.staged = None;
        self.rollbacks += 1;
        Ok(())
    }
}
