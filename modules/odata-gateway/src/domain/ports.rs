//! Outbound port to the warehouse.
//!
//! The gateway only needs two operations from a warehouse: execute a
//! parameterized read-only statement and describe a table's columns. Adapters
//! live under `infra::warehouse`.

use async_trait::async_trait;
use tablegate_odata::schema::WarehouseType;
use tablegate_sql::SqlParam;
use thiserror::Error;

/// A single result row, keyed by column name.
pub type WarehouseRow = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("table not found: {0}")]
    NotFound(String),

    #[error("warehouse query failed: {0}")]
    Query(String),
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Execute a parameterized statement and return all rows.
    async fn run_query(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<WarehouseRow>, WarehouseError>;

    /// Return `(raw_column_name, type)` pairs in ordinal order.
    async fn describe_table(
        &self,
        table: &str,
    ) -> Result<Vec<(String, WarehouseType)>, WarehouseError>;
}
