//! Column model shared by the schema describer, the SQL compiler and the
//! metadata generator, plus the warehouse column-name normalizer.

use serde::{Deserialize, Serialize};

/// Coarse warehouse column type, normalized from the raw type string a
/// warehouse reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseType {
    String,
    Integer,
    Float,
    Numeric,
    Boolean,
    Timestamp,
    Date,
    /// Anything we do not recognize; carried verbatim for diagnostics and
    /// mapped to `Edm.String` in metadata.
    Other(String),
}

impl WarehouseType {
    /// Normalize a raw warehouse type name (`"INT64"`, `"varchar"`, ...).
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "STRING" | "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "CHARACTER"
            | "CHARACTER VARYING" => WarehouseType::String,
            "INT64" | "INTEGER" | "INT" | "INT2" | "INT4" | "INT8" | "BIGINT" | "SMALLINT" => {
                WarehouseType::Integer
            }
            "FLOAT64" | "FLOAT" | "FLOAT4" | "FLOAT8" | "DOUBLE" | "DOUBLE PRECISION" | "REAL" => {
                WarehouseType::Float
            }
            "NUMERIC" | "DECIMAL" | "BIGNUMERIC" => WarehouseType::Numeric,
            "BOOL" | "BOOLEAN" => WarehouseType::Boolean,
            "TIMESTAMP" | "TIMESTAMPTZ" | "DATETIME" | "TIMESTAMP WITH TIME ZONE"
            | "TIMESTAMP WITHOUT TIME ZONE" => WarehouseType::Timestamp,
            "DATE" => WarehouseType::Date,
            _ => WarehouseType::Other(raw.to_owned()),
        }
    }

    /// EDM primitive type this column is exposed as in `$metadata`.
    #[must_use]
    pub fn edm_type(&self) -> &'static str {
        match self {
            WarehouseType::String | WarehouseType::Other(_) => "Edm.String",
            WarehouseType::Integer => "Edm.Int64",
            WarehouseType::Float => "Edm.Double",
            WarehouseType::Numeric => "Edm.Decimal",
            WarehouseType::Boolean => "Edm.Boolean",
            WarehouseType::Timestamp | WarehouseType::Date => "Edm.DateTimeOffset",
        }
    }
}

/// One column of a described table. Names are always normalized (see
/// [`normalize_name`]) before a descriptor is constructed, so downstream
/// components only ever see normalized names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub warehouse_type: WarehouseType,
    pub ordinal: usize,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, warehouse_type: WarehouseType, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            warehouse_type,
            ordinal,
        }
    }
}

/// Normalize a raw warehouse column name.
///
/// Applied at load time and again defensively at query time, so it must be
/// idempotent. Rules, in order: strip a leading byte-order-mark, replace every
/// character outside `[A-Za-z0-9_]` with `_`, prepend `col_` if the result
/// starts with a digit, truncate to 300 characters. An empty result maps to
/// `unnamed_column` so the output always matches `^[A-Za-z0-9_]{1,300}$`.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    let stripped = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let mut out = String::with_capacity(stripped.len());
    for ch in stripped.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }

    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert_str(0, "col_");
    }

    out.truncate(300);

    if out.is_empty() {
        return "unnamed_column".to_owned();
    }
    out
}
