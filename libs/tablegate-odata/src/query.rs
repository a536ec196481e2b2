//! The unified query-options model: one [`ODataQuery`] per request, parsed
//! once from the decoded query-string pairs and carried through compilation,
//! pagination and next-link construction.

use crate::ast::Expr;
use crate::limits::ODataLimits;
use crate::parser::parse_filter;
use crate::{Error, OrderBy};

/// Parsed OData query options for a single request.
///
/// `raw_filter` keeps the original `$filter` text so a continuation link can
/// re-emit it byte-for-byte; `filter` is the parsed expression (validated
/// against the schema later, once the column set is known).
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct ODataQuery {
    pub raw_filter: Option<String>,
    pub filter: Option<Box<Expr>>,
    pub select: Option<Vec<String>>,
    pub order: OrderBy,
    pub top: Option<u64>,
    pub skip: Option<u64>,
    pub count: bool,
}

impl ODataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter_raw(mut self, raw: impl Into<String>) -> Result<Self, Error> {
        let raw = raw.into();
        self.filter = Some(Box::new(parse_filter(&raw)?));
        self.raw_filter = Some(raw);
        Ok(self)
    }

    pub fn with_select(mut self, fields: Vec<String>) -> Self {
        self.select = Some(fields);
        self
    }

    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order = order;
        self
    }

    pub fn with_top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub fn filter(&self) -> Option<&Expr> {
        self.filter.as_deref()
    }

    #[must_use]
    pub fn skip_or_zero(&self) -> u64 {
        self.skip.unwrap_or(0)
    }

    #[must_use]
    pub fn selected_fields(&self) -> Option<&[String]> {
        self.select.as_deref()
    }

    /// Parse decoded query-string pairs into an `ODataQuery`.
    ///
    /// Options are matched by their exact OData v4 names. Parameters without
    /// a `$` prefix are ignored (they belong to outer layers, e.g. auth);
    /// unknown `$`-prefixed options are rejected rather than silently
    /// dropped.
    ///
    /// # Errors
    /// - [`Error::FilterSyntax`] for malformed or oversized `$filter`
    /// - [`Error::InvalidOrderBy`] for malformed or oversized `$orderby`
    /// - [`Error::InvalidQueryOption`] for non-integer `$top`/`$skip` or an
    ///   unrecognized `$count` value
    /// - [`Error::UnsupportedOption`] for any other `$` option
    pub fn from_pairs<'a, I>(pairs: I, limits: &ODataLimits) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut query = ODataQuery::new();

        for (key, value) in pairs {
            match key {
                "$filter" => {
                    limits.validate_filter(value)?;
                    query = query.with_filter_raw(value)?;
                }
                "$select" => {
                    let fields: Vec<String> = value
                        .split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(str::to_owned)
                        .collect();
                    if !fields.is_empty() {
                        query.select = Some(fields);
                    }
                }
                "$orderby" => {
                    let order = OrderBy::parse(value)?;
                    limits.validate_orderby_count(order.0.len())?;
                    query.order = order;
                }
                "$top" => {
                    query.top = Some(parse_unsigned("$top", value)?);
                }
                "$skip" => {
                    query.skip = Some(parse_unsigned("$skip", value)?);
                }
                "$count" => {
                    query.count = parse_count(value)?;
                }
                other if other.starts_with('$') => {
                    return Err(Error::UnsupportedOption(other.to_owned()));
                }
                _ => {}
            }
        }

        Ok(query)
    }

    /// Render back into a canonical query string with percent-encoded values.
    ///
    /// Option order is fixed (`$filter`, `$select`, `$orderby`, `$top`,
    /// `$skip`, `$count`) so continuation links are deterministic. The output
    /// reparses to an equivalent `ODataQuery` via [`ODataQuery::from_pairs`].
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(raw) = &self.raw_filter {
            parts.push(format!("$filter={}", urlencoding::encode(raw)));
        }
        if let Some(select) = &self.select {
            parts.push(format!(
                "$select={}",
                urlencoding::encode(&select.join(","))
            ));
        }
        if !self.order.is_empty() {
            parts.push(format!(
                "$orderby={}",
                urlencoding::encode(&self.order.render())
            ));
        }
        if let Some(top) = self.top {
            parts.push(format!("$top={top}"));
        }
        if let Some(skip) = self.skip {
            parts.push(format!("$skip={skip}"));
        }
        if self.count {
            parts.push("$count=true".to_owned());
        }
        parts.join("&")
    }
}

fn parse_unsigned(option: &'static str, value: &str) -> Result<u64, Error> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::InvalidQueryOption {
            option,
            value: value.to_owned(),
        })
}

fn parse_count(value: &str) -> Result<bool, Error> {
    // Accept the spellings the original service accepted
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(Error::InvalidQueryOption {
            option: "$count",
            value: value.to_owned(),
        }),
    }
}
