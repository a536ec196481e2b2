//! OData v4 protocol core: query-option model, filter parsing and pagination.
//!
//! This crate is deliberately warehouse-agnostic. It turns the raw query
//! string of an OData request into a typed [`ODataQuery`], parses `$filter`
//! expressions into an AST, validates field references against a column set,
//! and derives paging decisions ([`page`]) including the `@odata.nextLink`
//! continuation URL. SQL generation lives in `tablegate-sql`.

pub mod filter;
pub mod lexer;
pub mod limits;
pub mod page;
pub mod parser;
pub mod query;
pub mod schema;

pub use filter::{FilterNode, FilterOp, resolve_filter};
pub use limits::ODataLimits;
pub use page::{Page, PageInfo, next_link, paginate};
pub use query::ODataQuery;
pub use schema::{ColumnDescriptor, WarehouseType, normalize_name};

pub mod ast {
    use bigdecimal::BigDecimal;

    /// Raw `$filter` expression tree as produced by the parser, before field
    /// references are validated against a schema.
    #[derive(Clone, Debug, PartialEq)]
    pub enum Expr {
        And(Box<Expr>, Box<Expr>),
        Or(Box<Expr>, Box<Expr>),
        Not(Box<Expr>),
        Compare(Box<Expr>, CompareOperator, Box<Expr>),
        Function(String, Vec<Expr>),
        Identifier(String),
        Value(Value),
    }

    impl Expr {
        /// Combine two expressions with AND: `expr1 and expr2`
        #[must_use]
        pub fn and(self, other: Expr) -> Expr {
            Expr::And(Box::new(self), Box::new(other))
        }

        /// Combine two expressions with OR: `expr1 or expr2`
        #[must_use]
        pub fn or(self, other: Expr) -> Expr {
            Expr::Or(Box::new(self), Box::new(other))
        }
    }

    impl std::ops::Not for Expr {
        type Output = Expr;

        fn not(self) -> Self::Output {
            Expr::Not(Box::new(self))
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum CompareOperator {
        Eq,
        Ne,
        Gt,
        Ge,
        Lt,
        Le,
    }

    /// Literal value inside a `$filter` expression.
    #[derive(Clone, Debug, PartialEq)]
    pub enum Value {
        Null,
        Bool(bool),
        Number(BigDecimal),
        String(String),
    }

    impl std::fmt::Display for Value {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Value::Null => write!(f, "null"),
                Value::Bool(_) => write!(f, "bool"),
                Value::Number(_) => write!(f, "number"),
                Value::String(_) => write!(f, "string"),
            }
        }
    }
}

// Ordering primitives
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SortDir {
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl SortDir {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub field: String,
    pub dir: SortDir,
}

/// Parsed `$orderby` option: an ordered list of sort keys.
///
/// Tie ordering is whatever the warehouse returns. Callers that need stable
/// pagination must include a deterministic tiebreak field themselves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct OrderBy(pub Vec<OrderKey>);

impl OrderBy {
    pub fn empty() -> Self {
        Self(vec![])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse the raw `$orderby` value, e.g. `"Date desc, Campaign"`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidOrderBy`] for empty segments with a direction,
    /// unknown directions, or trailing tokens.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let mut keys = Vec::new();
        for seg in raw.split(',') {
            let seg = seg.trim();
            if seg.is_empty() {
                continue;
            }
            let mut tokens = seg.split_whitespace();
            let field = tokens
                .next()
                .ok_or_else(|| Error::InvalidOrderBy(seg.to_owned()))?;
            let dir = match tokens.next() {
                None => SortDir::Asc,
                Some(d) if d.eq_ignore_ascii_case("asc") => SortDir::Asc,
                Some(d) if d.eq_ignore_ascii_case("desc") => SortDir::Desc,
                Some(_) => return Err(Error::InvalidOrderBy(seg.to_owned())),
            };
            if tokens.next().is_some() {
                return Err(Error::InvalidOrderBy(seg.to_owned()));
            }
            keys.push(OrderKey {
                field: field.to_owned(),
                dir,
            });
        }
        Ok(OrderBy(keys))
    }

    /// Render back into `$orderby` syntax; ascending keys stay bare.
    #[must_use]
    pub fn render(&self) -> String {
        self.0
            .iter()
            .map(|k| match k.dir {
                SortDir::Asc => k.field.clone(),
                SortDir::Desc => format!("{} desc", k.field),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Display for OrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(none)");
        }
        let formatted: Vec<String> = self
            .0
            .iter()
            .map(|key| format!("{} {}", key.field, key.dir.as_str()))
            .collect();
        write!(f, "{}", formatted.join(", "))
    }
}

/// Unified error type for all OData protocol operations.
///
/// Parsing and validation errors are deterministic given the same input and
/// must never be retried; they map to 4xx Problem responses at the HTTP layer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed `$filter` input; `position` is the byte offset of the
    /// offending token in the raw string.
    #[error("invalid $filter at offset {position}: {message}")]
    FilterSyntax { position: usize, message: String },

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("unsupported query option: {0}")]
    UnsupportedOption(String),

    #[error("invalid $orderby segment: {0}")]
    InvalidOrderBy(String),

    #[error("invalid value for {option}: {value}")]
    InvalidQueryOption {
        option: &'static str,
        value: String,
    },
}

impl Error {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Error::FilterSyntax {
            position,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests;
