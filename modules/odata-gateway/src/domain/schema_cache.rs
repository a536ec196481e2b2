//! Schema describer with a TTL-bounded snapshot cache.
//!
//! Reads are lock-free against an `ArcSwap` snapshot; a refresh replaces the
//! whole snapshot atomically, so in-flight readers never observe a torn map.
//! Concurrent lookups for the same table may both fetch; the last write wins,
//! which is acceptable because schema changes are managed out-of-band and a
//! stale-but-valid entry is explicitly allowed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use tablegate_odata::schema::{ColumnDescriptor, WarehouseType, normalize_name};

use super::error::DomainError;
use super::ports::Warehouse;

#[derive(Clone)]
struct CachedSchema {
    columns: Arc<[ColumnDescriptor]>,
    fetched_at: Instant,
}

pub struct SchemaDescriber {
    warehouse: Arc<dyn Warehouse>,
    ttl: Duration,
    snapshot: ArcSwap<HashMap<String, CachedSchema>>,
}

impl SchemaDescriber {
    pub fn new(warehouse: Arc<dyn Warehouse>, ttl: Duration) -> Self {
        Self {
            warehouse,
            ttl,
            snapshot: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Column descriptors for `table`, served from cache while the entry is
    /// fresh. All names are normalized before anything downstream sees them.
    ///
    /// # Errors
    /// `DomainError::SchemaNotFound` when the warehouse does not know the
    /// table; upstream errors pass through.
    pub async fn describe(&self, table: &str) -> Result<Arc<[ColumnDescriptor]>, DomainError> {
        if let Some(entry) = self.snapshot.load().get(table)
            && entry.fetched_at.elapsed() < self.ttl
        {
            return Ok(Arc::clone(&entry.columns));
        }
        self.refresh(table).await
    }

    /// Fetch the schema from the warehouse and replace the cached entry.
    ///
    /// # Errors
    /// Same contract as [`SchemaDescriber::describe`].
    pub async fn refresh(&self, table: &str) -> Result<Arc<[ColumnDescriptor]>, DomainError> {
        let raw = self
            .warehouse
            .describe_table(table)
            .await
            .map_err(|e| DomainError::from_warehouse(e, table))?;

        let columns = build_descriptors(raw);
        tracing::debug!(table, columns = columns.len(), "described table schema");

        let entry = CachedSchema {
            columns: Arc::clone(&columns),
            fetched_at: Instant::now(),
        };
        self.snapshot.rcu(|current| {
            let mut next = (**current).clone();
            next.insert(table.to_owned(), entry.clone());
            next
        });

        Ok(columns)
    }
}

/// Normalize raw column names and assign ordinals. Collisions after
/// normalization get an ordinal suffix so every descriptor name stays unique.
fn build_descriptors(raw: Vec<(String, WarehouseType)>) -> Arc<[ColumnDescriptor]> {
    let mut seen: Vec<String> = Vec::with_capacity(raw.len());
    raw.into_iter()
        .enumerate()
        .map(|(ordinal, (name, warehouse_type))| {
            let mut normalized = normalize_name(&name);
            if seen.iter().any(|s| s == &normalized) {
                normalized = format!("{normalized}_{ordinal}");
            }
            seen.push(normalized.clone());
            ColumnDescriptor::new(normalized, warehouse_type, ordinal)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablegate_odata::schema::WarehouseType;

    #[test]
    fn collisions_get_ordinal_suffix() {
        let cols = build_descriptors(vec![
            ("Spend (A)".to_owned(), WarehouseType::Numeric),
            ("Spend [A]".to_owned(), WarehouseType::Numeric),
        ]);
        assert_eq!(cols[0].name, "Spend__A_");
        assert_eq!(cols[1].name, "Spend__A__1");
    }
}
