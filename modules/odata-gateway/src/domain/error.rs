//! Domain-level error taxonomy.
//!
//! Protocol errors (parse/validation/compilation) are deterministic for a
//! given input and never retried. Upstream failures are retryable by the
//! caller with backoff; the gateway itself performs no retries so request
//! latency stays predictable.

use thiserror::Error;

use super::ports::WarehouseError;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Client-caused query-option error (syntax, unknown field, unsupported
    /// construct); carries the offending token or field.
    #[error(transparent)]
    Protocol(#[from] tablegate_odata::Error),

    #[error("unknown entity set: {0}")]
    SchemaNotFound(String),

    /// Warehouse did not answer within the configured budget. Retryable.
    #[error("warehouse query timed out after {0}s")]
    UpstreamTimeout(u64),

    /// Warehouse rejected or failed the query. Retryable by the caller; also
    /// where literal/column type mismatches surface, since the parser is
    /// schema-agnostic.
    #[error("upstream query failed: {0}")]
    Query(String),
}

impl DomainError {
    pub(crate) fn from_warehouse(err: WarehouseError, table: &str) -> Self {
        match err {
            WarehouseError::NotFound(_) => DomainError::SchemaNotFound(table.to_owned()),
            WarehouseError::Query(msg) => DomainError::Query(msg),
        }
    }
}
