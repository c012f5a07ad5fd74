//! PostgreSQL gateway
//!
//! Each source file runs inside one transaction, opened on the first
//! statement. Every statement additionally runs inside its own savepoint:
//! a failed statement aborts the enclosing transaction in PostgreSQL, and
//! rolling back to the savepoint keeps the rest of the file's work intact.

use async_trait::async_trait;
use brandsync_common::{CanonicalRecord, RecordKey};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Acquire, Postgres, Transaction};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Lookup, PersistenceGateway};
use crate::config::DatabaseConfig;
use crate::error::{ConnectionError, GatewayError};

/// PostgreSQL's identifier length limit in bytes
const MAX_IDENTIFIER_LEN: usize = 63;

/// A validated, optionally schema-qualified table name.
///
/// The table name comes from configuration and is interpolated into SQL,
/// so only plain identifiers are accepted and both parts are always quoted.
/// Quoting makes the name case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let invalid = || GatewayError::InvalidTable(raw.to_string());
        let parts: Vec<&str> = raw.trim().split('.').collect();
        if !parts.iter().all(|part| is_identifier(part)) {
            return Err(invalid());
        }

        match parts.as_slice() {
            [table] => Ok(Self {
                schema: None,
                table: table.to_string(),
            }),
            [schema, table] => Ok(Self {
                schema: Some(schema.to_string()),
                table: table.to_string(),
            }),
            _ => Err(invalid()),
        }
    }

    /// SQL form with each part double-quoted
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("\"{}\".\"{}\"", schema, self.table),
            None => format!("\"{}\"", self.table),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => f.write_str(&self.table),
        }
    }
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {},
        _ => return false,
    }
    part.len() <= MAX_IDENTIFIER_LEN && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// SQL text for the three statements, rendered once per gateway
#[derive(Debug, Clone)]
struct Statements {
    lookup: String,
    insert: String,
    update: String,
    verify: String,
}

impl Statements {
    fn new(table: &TableName) -> Self {
        let table = table.quoted();
        Self {
            lookup: format!(
                "SELECT category FROM {} WHERE location = $1 AND floor = $2 AND name = $3 LIMIT 1",
                table
            ),
            insert: format!(
                "INSERT INTO {} (location, floor, name, category) VALUES ($1, $2, $3, $4)",
                table
            ),
            update: format!(
                "UPDATE {} SET category = $1 WHERE location = $2 AND floor = $3 AND name = $4",
                table
            ),
            verify: format!("SELECT location, floor, name, category FROM {} LIMIT 0", table),
        }
    }
}

pub struct PgGateway {
    pool: PgPool,
    table: TableName,
    statements: Statements,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgGateway {
    /// Connect, then verify the table exists with the expected columns
    pub async fn connect(config: &DatabaseConfig, table: &str) -> Result<Self, ConnectionError> {
        let table = TableName::parse(table)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(ConnectionError::Connect)?;

        let gateway = Self::new(pool, table);
        gateway.verify_table().await?;
        debug!(table = %gateway.table, "Connected to database");
        Ok(gateway)
    }

    pub fn new(pool: PgPool, table: TableName) -> Self {
        let statements = Statements::new(&table);
        Self {
            pool,
            table,
            statements,
            tx: None,
        }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fail unless the table exists with the four canonical columns
    pub async fn verify_table(&self) -> Result<(), ConnectionError> {
        sqlx::query(&self.statements.verify)
            .execute(&self.pool)
            .await
            .map_err(|source| ConnectionError::TableUnavailable {
                table: self.table.to_string(),
                source,
            })?;
        Ok(())
    }
}

/// The open unit-of-work transaction, begun on first use
async fn open<'a>(
    slot: &'a mut Option<Transaction<'static, Postgres>>,
    pool: &PgPool,
) -> Result<&'a mut Transaction<'static, Postgres>, GatewayError> {
    let tx = match slot.take() {
        Some(tx) => tx,
        None => pool.begin().await?,
    };
    Ok(slot.insert(tx))
}

/// Release the savepoint on success, roll back to it on failure
async fn settle<T>(
    savepoint: Transaction<'_, Postgres>,
    result: Result<T, sqlx::Error>,
) -> Result<T, GatewayError> {
    match result {
        Ok(value) => {
            savepoint.commit().await?;
            Ok(value)
        },
        Err(err) => {
            if let Err(rollback_err) = savepoint.rollback().await {
                warn!(error = %rollback_err, "Failed to roll back to savepoint");
            }
            Err(err.into())
        },
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn lookup_category(&mut self, key: &RecordKey) -> Result<Lookup, GatewayError> {
        let tx = open(&mut self.tx, &self.pool).await?;
        let mut savepoint = Acquire::begin(&mut *tx).await?;
        let result = sqlx::query_as::<_, (Option<String>,)>(&self.statements.lookup)
            .bind(&key.location)
            .bind(&key.floor)
            .bind(&key.name)
            .fetch_optional(&mut *savepoint)
            .await;

        let row = settle(savepoint, result).await?;
        Ok(match row {
            Some((category,)) => Lookup::Found(category),
            None => Lookup::NotFound,
        })
    }

    async fn insert_record(&mut self, record: &CanonicalRecord) -> Result<(), GatewayError> {
        let tx = open(&mut self.tx, &self.pool).await?;
        let mut savepoint = Acquire::begin(&mut *tx).await?;
        let result = sqlx::query(&self.statements.insert)
            .bind(&record.location)
            .bind(&record.floor)
            .bind(&record.name)
            .bind(&record.category)
            .execute(&mut *savepoint)
            .await;

        settle(savepoint, result).await?;
        Ok(())
    }

    async fn update_category(&mut self, key: &RecordKey, category: &str) -> Result<(), GatewayError> {
        let tx = open(&mut self.tx, &self.pool).await?;
        let mut savepoint = Acquire::begin(&mut *tx).await?;
        let result = sqlx::query(&self.statements.update)
            .bind(category)
            .bind(&key.location)
            .bind(&key.floor)
            .bind(&key.name)
            .execute(&mut *savepoint)
            .await;

        let done = settle(savepoint, result).await?;
        debug!(key = %key, rows = done.rows_affected(), "Updated category");
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), GatewayError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), GatewayError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_table_name() {
        let table = TableName::parse("brand_presence").unwrap();
        assert_eq!(table.quoted(), "\"brand_presence\"");
        assert_eq!(table.to_string(), "brand_presence");
    }

    #[test]
    fn test_schema_qualified_table_name() {
        let table = TableName::parse("mall.BrandLocation").unwrap();
        assert_eq!(table.quoted(), "\"mall\".\"BrandLocation\"");
    }

    #[test]
    fn test_unicode_table_name() {
        assert!(TableName::parse("品牌位置").is_ok());
    }

    #[test]
    fn test_rejects_injection_attempts() {
        for raw in [
            "",
            "brands; DROP TABLE brands",
            "\"brands\"",
            "a.b.c",
            "1brands",
            "brands--",
            ".brands",
        ] {
            assert!(
                matches!(TableName::parse(raw), Err(GatewayError::InvalidTable(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_overlong_identifier() {
        let raw = "b".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(TableName::parse(&raw).is_err());
        assert!(TableName::parse(&"b".repeat(MAX_IDENTIFIER_LEN)).is_ok());
    }

    #[test]
    fn test_statements_use_quoted_table() {
        let statements = Statements::new(&TableName::parse("public.brands").unwrap());
        assert!(statements.lookup.starts_with("SELECT category FROM \"public\".\"brands\""));
        assert!(statements.update.contains("SET category = $1"));
    }
}
