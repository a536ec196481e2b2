//! Request orchestration: schema lookup, compilation, execution, pagination.

use std::sync::Arc;
use std::time::Duration;

use tablegate_odata::{ODataLimits, ODataQuery, Page, PageInfo, paginate};
use tablegate_odata::schema::ColumnDescriptor;
use tablegate_sql::{CompiledQuery, compile_count, compile_select};

use crate::config::GatewayConfig;

use super::error::DomainError;
use super::ports::{Warehouse, WarehouseRow};
use super::schema_cache::SchemaDescriber;

/// One executed entity-set page, together with the paging decision needed to
/// build the continuation link.
#[derive(Debug)]
pub struct EntitySetPage {
    /// Canonical entity-set name (configured spelling).
    pub entity_set: String,
    pub page: Page,
    pub info: PageInfo,
}

/// Health of a single exposed entity set.
#[derive(Debug, serde::Serialize)]
pub struct EntitySetHealth {
    pub name: String,
    pub reachable: bool,
}

pub struct GatewayService {
    config: GatewayConfig,
    limits: ODataLimits,
    warehouse: Arc<dyn Warehouse>,
    schemas: SchemaDescriber,
    query_timeout: Duration,
}

impl GatewayService {
    pub fn new(warehouse: Arc<dyn Warehouse>, config: GatewayConfig) -> Self {
        let limits = config.limits();
        let schemas = SchemaDescriber::new(
            Arc::clone(&warehouse),
            Duration::from_secs(config.schema_cache_ttl_secs),
        );
        let query_timeout = Duration::from_secs(config.query_timeout_secs);
        Self {
            config,
            limits,
            warehouse,
            schemas,
            query_timeout,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn limits(&self) -> &ODataLimits {
        &self.limits
    }

    /// Resolve a requested entity-set name against the configured allowlist,
    /// case-insensitively, returning the canonical spelling.
    ///
    /// # Errors
    /// `DomainError::SchemaNotFound` for tables that are not exposed.
    pub fn resolve_entity_set(&self, name: &str) -> Result<&str, DomainError> {
        self.config
            .entity_sets
            .iter()
            .find(|s| s.eq_ignore_ascii_case(name))
            .map(String::as_str)
            .ok_or_else(|| DomainError::SchemaNotFound(name.to_owned()))
    }

    /// Column descriptors for an exposed entity set (cached).
    ///
    /// # Errors
    /// `SchemaNotFound` for unexposed or unknown tables; upstream errors pass
    /// through.
    pub async fn describe(&self, name: &str) -> Result<Arc<[ColumnDescriptor]>, DomainError> {
        let table = self.resolve_entity_set(name)?;
        self.schemas.describe(table).await
    }

    /// Execute one entity-set request end to end.
    ///
    /// # Errors
    /// Protocol errors for invalid options or unknown fields,
    /// `SchemaNotFound`, `UpstreamTimeout` or `Query` from execution.
    pub async fn query_entity_set(
        &self,
        name: &str,
        query: &ODataQuery,
    ) -> Result<EntitySetPage, DomainError> {
        let table = self.resolve_entity_set(name)?.to_owned();
        let columns = self.schemas.describe(&table).await?;

        let compiled = compile_select(&table, query, &columns, &self.limits)?;
        tracing::debug!(table = %table, sql = %compiled.sql, "compiled entity-set query");

        let rows = self.run(&table, &compiled).await?;
        let info = paginate(
            rows.len(),
            self.limits.effective_limit(query.top),
            query.skip_or_zero(),
        );

        let total_count = if query.count {
            Some(self.run_count(&table, query, &columns).await?)
        } else {
            None
        };

        tracing::info!(
            table = %table,
            rows = rows.len(),
            has_more = info.has_more,
            "entity-set query served"
        );

        Ok(EntitySetPage {
            entity_set: table,
            page: Page {
                rows,
                total_count,
                has_more: info.has_more,
            },
            info,
        })
    }

    /// Bare `$count` request: only the `$filter` option participates.
    ///
    /// # Errors
    /// Same contract as [`GatewayService::query_entity_set`].
    pub async fn count_entity_set(
        &self,
        name: &str,
        query: &ODataQuery,
    ) -> Result<u64, DomainError> {
        let table = self.resolve_entity_set(name)?.to_owned();
        let columns = self.schemas.describe(&table).await?;
        self.run_count(&table, query, &columns).await
    }

    /// Probe every exposed entity set by describing it.
    pub async fn health(&self) -> Vec<EntitySetHealth> {
        let mut out = Vec::with_capacity(self.config.entity_sets.len());
        for name in &self.config.entity_sets {
            let reachable = self.schemas.describe(name).await.is_ok();
            out.push(EntitySetHealth {
                name: name.clone(),
                reachable,
            });
        }
        out
    }

    async fn run_count(
        &self,
        table: &str,
        query: &ODataQuery,
        columns: &[ColumnDescriptor],
    ) -> Result<u64, DomainError> {
        let compiled = compile_count(table, query, columns)?;
        tracing::debug!(table = %table, sql = %compiled.sql, "compiled count query");
        let rows = self.run(table, &compiled).await?;
        Ok(extract_count(&rows))
    }

    /// Execute a compiled statement under the query timeout. The timeout
    /// drops the in-flight future, cancelling the warehouse call, and maps to
    /// the retryable `UpstreamTimeout`.
    async fn run(
        &self,
        table: &str,
        compiled: &CompiledQuery,
    ) -> Result<Vec<WarehouseRow>, DomainError> {
        let fut = self.warehouse.run_query(&compiled.sql, &compiled.params);
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result.map_err(|e| {
                tracing::error!(table = %table, error = %e, "warehouse query failed");
                DomainError::from_warehouse(e, table)
            }),
            Err(_) => {
                tracing::error!(
                    table = %table,
                    timeout_secs = self.query_timeout.as_secs(),
                    "warehouse query timed out"
                );
                Err(DomainError::UpstreamTimeout(self.query_timeout.as_secs()))
            }
        }
    }
}

/// The count statement yields a single row with a single column whose name
/// varies by warehouse; take the first value.
fn extract_count(rows: &[WarehouseRow]) -> u64 {
    rows.first()
        .and_then(|row| row.values().next())
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0)
}
