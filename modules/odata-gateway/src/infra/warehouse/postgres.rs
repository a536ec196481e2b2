//! Postgres warehouse adapter.
//!
//! Implements the warehouse port over a sqlx connection pool. The compiled
//! statements use dialect-neutral `?` placeholders; they are rewritten to
//! Postgres `$n` placeholders here. The rewrite is a plain character scan,
//! which is sound because compiled SQL never contains literals — every `?` is
//! a placeholder by construction.

use std::fmt::Write as _;

use async_trait::async_trait;
use bigdecimal::ToPrimitive;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row, TypeInfo};
use tablegate_odata::schema::{WarehouseType, normalize_name};
use tablegate_sql::SqlParam;

use crate::domain::ports::{Warehouse, WarehouseError, WarehouseRow};

pub struct PostgresWarehouse {
    pool: PgPool,
}

impl PostgresWarehouse {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool against the given DSN.
    ///
    /// # Errors
    /// Propagates connection errors from sqlx.
    pub async fn connect(dsn: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(dsn)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Warehouse for PostgresWarehouse {
    async fn run_query(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<WarehouseRow>, WarehouseError> {
        let numbered = number_placeholders(sql);
        let mut query = sqlx::query(&numbered);
        for param in params {
            query = match param {
                SqlParam::Null => query.bind(Option::<String>::None),
                SqlParam::Bool(b) => query.bind(*b),
                SqlParam::Int(i) => query.bind(*i),
                SqlParam::Decimal(d) => query.bind(d.clone()),
                SqlParam::Text(s) => query.bind(s.clone()),
            };
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| WarehouseError::Query(e.to_string()))?;

        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn describe_table(
        &self,
        table: &str,
    ) -> Result<Vec<(String, WarehouseType)>, WarehouseError> {
        let rows = sqlx::query(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_name = $1 ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WarehouseError::Query(e.to_string()))?;

        if rows.is_empty() {
            return Err(WarehouseError::NotFound(table.to_owned()));
        }

        rows.iter()
            .map(|row| {
                let name: String = row
                    .try_get(0)
                    .map_err(|e| WarehouseError::Query(e.to_string()))?;
                let data_type: String = row
                    .try_get(1)
                    .map_err(|e| WarehouseError::Query(e.to_string()))?;
                Ok((name, WarehouseType::from_raw(&data_type)))
            })
            .collect()
    }
}

/// Rewrite `?` placeholders to `$1..$n`.
fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0u32;
    for ch in sql.chars() {
        if ch == '?' {
            n += 1;
            let _ = write!(out, "${n}");
        } else {
            out.push(ch);
        }
    }
    out
}

/// Decode a driver row into a JSON map keyed by column name. Names coming
/// back from the driver are the quoted normalized identifiers we selected;
/// `normalize_name` is idempotent, so applying it again is a no-op guard.
fn row_to_json(row: &PgRow) -> WarehouseRow {
    let mut out = WarehouseRow::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let value = match column.type_info().name() {
            "BOOL" => row
                .try_get::<Option<bool>, _>(idx)
                .ok()
                .flatten()
                .map(Value::Bool),
            "INT2" => row
                .try_get::<Option<i16>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::from(i64::from(v))),
            "INT4" => row
                .try_get::<Option<i32>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::from(i64::from(v))),
            "INT8" => row
                .try_get::<Option<i64>, _>(idx)
                .ok()
                .flatten()
                .map(Value::from),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(idx)
                .ok()
                .flatten()
                .and_then(|v| serde_json::Number::from_f64(f64::from(v)))
                .map(Value::Number),
            "FLOAT8" => row
                .try_get::<Option<f64>, _>(idx)
                .ok()
                .flatten()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            "NUMERIC" => row
                .try_get::<Option<sqlx::types::BigDecimal>, _>(idx)
                .ok()
                .flatten()
                .and_then(|d| d.to_f64())
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            "TIMESTAMPTZ" => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_rfc3339())),
            "TIMESTAMP" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_string())),
            "DATE" => row
                .try_get::<Option<chrono::NaiveDate>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_string())),
            _ => row
                .try_get::<Option<String>, _>(idx)
                .ok()
                .flatten()
                .map(Value::String),
        };
        out.insert(normalize_name(column.name()), value.unwrap_or(Value::Null));
    }
    out
}
