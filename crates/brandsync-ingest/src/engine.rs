//! Reconciliation engine
//!
//! Decides, per record, whether the canonical table needs a new row, a
//! category fill-in, or nothing:
//!
//! | Table state for the key | Action |
//! |---|---|
//! | no row | insert all four fields |
//! | row with NULL or empty category | overwrite category with the incoming value |
//! | row with a non-empty category | nothing |
//!
//! A populated category is never overwritten, so re-running the same input
//! only ever fills gaps.

use brandsync_common::{CanonicalRecord, Classification};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GatewayError;
use crate::gateway::{Lookup, PersistenceGateway};

/// How records are applied to the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Insert, fill in empty categories, or skip
    #[default]
    Reconcile,
    /// Insert every record without looking anything up
    Append,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Reconcile => f.write_str("reconcile"),
            ImportMode::Append => f.write_str("append"),
        }
    }
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reconcile" => Ok(ImportMode::Reconcile),
            "append" => Ok(ImportMode::Append),
            _ => Err(format!("Invalid import mode: {}. Expected reconcile or append", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationEngine {
    mode: ImportMode,
}

impl ReconciliationEngine {
    pub fn new(mode: ImportMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ImportMode {
        self.mode
    }

    pub async fn process<G>(
        &self,
        gateway: &mut G,
        record: &CanonicalRecord,
    ) -> Result<Classification, GatewayError>
    where
        G: PersistenceGateway + ?Sized,
    {
        match self.mode {
            ImportMode::Reconcile => reconcile(gateway, record).await,
            ImportMode::Append => append(gateway, record).await,
        }
    }
}

/// Apply one record under the insert / fill-in / skip rule
pub async fn reconcile<G>(
    gateway: &mut G,
    record: &CanonicalRecord,
) -> Result<Classification, GatewayError>
where
    G: PersistenceGateway + ?Sized,
{
    let key = record.key();
    let existing = gateway.lookup_category(&key).await?;

    match existing {
        Lookup::NotFound => {
            gateway.insert_record(record).await?;
            Ok(Classification::Insert)
        },
        // An empty incoming category still counts as a patch
        found if found.has_empty_category() => {
            gateway.update_category(&key, &record.category).await?;
            Ok(Classification::Patch)
        },
        Lookup::Found(_) => Ok(Classification::Skip),
    }
}

/// Insert unconditionally; duplicate keys are left to table constraints
pub async fn append<G>(
    gateway: &mut G,
    record: &CanonicalRecord,
) -> Result<Classification, GatewayError>
where
    G: PersistenceGateway + ?Sized,
{
    gateway.insert_record(record).await?;
    Ok(Classification::Insert)
}
