//! Persistence gateway
//!
//! The engine talks to the canonical table only through
//! [`PersistenceGateway`]. Each source file is one unit of work: writes are
//! staged until [`commit`](PersistenceGateway::commit) and discarded by
//! [`rollback`](PersistenceGateway::rollback). Lookups observe earlier
//! uncommitted writes of the same unit, so a key repeated within one file
//! is inserted once and then patched or skipped.
//!
//! A gateway is used by a single run at a time. Two concurrent runs against
//! the same table can both observe "not found" for one key; without a
//! unique constraint on `(location, floor, name)` both inserts succeed.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use brandsync_common::{CanonicalRecord, RecordKey};

use crate::error::GatewayError;

pub use memory::MemoryGateway;
pub use postgres::{PgGateway, TableName};

/// Result of looking a key up in the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    NotFound,
    /// A row exists; `None` is a NULL category
    Found(Option<String>),
}

impl Lookup {
    /// True when the row exists but its category is NULL or empty
    pub fn has_empty_category(&self) -> bool {
        matches!(self, Lookup::Found(None)) || matches!(self, Lookup::Found(Some(c)) if c.is_empty())
    }
}

#[async_trait]
pub trait PersistenceGateway: Send {
    /// Category of the first row matching `key`
    async fn lookup_category(&mut self, key: &RecordKey) -> Result<Lookup, GatewayError>;

    /// Stage a new row with all four canonical fields
    async fn insert_record(&mut self, record: &CanonicalRecord) -> Result<(), GatewayError>;

    /// Stage a category update for every row matching `key`
    async fn update_category(&mut self, key: &RecordKey, category: &str) -> Result<(), GatewayError>;

    /// Make all staged writes durable
    async fn commit(&mut self) -> Result<(), GatewayError>;

    /// Discard all staged writes
    async fn rollback(&mut self) -> Result<(), GatewayError>;
}
