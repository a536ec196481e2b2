//! Gateway configuration.

use serde::{Deserialize, Serialize};
use tablegate_odata::ODataLimits;

/// Configuration of the OData gateway module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Warehouse tables exposed as entity sets. Requests for any other table
    /// are rejected with `SchemaNotFound` without touching the warehouse.
    pub entity_sets: Vec<String>,
    /// EDM schema namespace used in `$metadata`.
    pub namespace: String,
    /// EDM entity-container name.
    pub container: String,
    /// Absolute base URL clients reach this service under; used for
    /// `@odata.context` and continuation links.
    pub public_base_url: String,
    /// Default and maximum page size; larger `$top` values are clamped.
    pub max_page_size: u64,
    /// Maximum `$filter` expression length in bytes.
    pub max_filter_length: usize,
    /// Maximum number of `$orderby` keys.
    pub max_orderby_fields: usize,
    /// How long a described table schema stays cached.
    pub schema_cache_ttl_secs: u64,
    /// Upper bound on a single warehouse query; elapsed time past this
    /// surfaces as a retryable upstream timeout.
    pub query_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            entity_sets: Vec::new(),
            namespace: "Tablegate.Service".to_owned(),
            container: "DefaultContainer".to_owned(),
            public_base_url: "http://localhost:8080".to_owned(),
            max_page_size: 1000,
            max_filter_length: 2000,
            max_orderby_fields: 5,
            schema_cache_ttl_secs: 300,
            query_timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    #[must_use]
    pub fn limits(&self) -> ODataLimits {
        ODataLimits::new()
            .with_max_page_size(self.max_page_size)
            .with_max_filter_length(self.max_filter_length)
            .with_max_orderby_fields(self.max_orderby_fields)
    }

    /// Base URL with any trailing slash removed.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }
}
