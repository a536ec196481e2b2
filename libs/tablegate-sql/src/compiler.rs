//! Expression-tree-to-parameterized-statement compiler.

use tablegate_odata::ast::Value;
use tablegate_odata::filter::{FilterNode, FilterOp, resolve_filter};
use tablegate_odata::schema::ColumnDescriptor;
use tablegate_odata::{Error, ODataLimits, ODataQuery, SortDir};

use crate::params::SqlParam;

/// A compiled statement with its ordered bound parameters. Request-scoped;
/// discarded after execution.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Compile the row-fetching statement for a request.
///
/// `$select` restricts the emitted columns; without it all columns are listed
/// explicitly in descriptor order. The effective `LIMIT` is `$top` clamped to
/// the configured page size (`$top=0` compiles to `LIMIT 0`); `OFFSET` is
/// emitted only for a positive `$skip`.
///
/// # Errors
/// Returns [`Error::UnknownField`] when `$select`, `$orderby` or `$filter`
/// reference a column not in `columns`, plus any filter resolution error.
pub fn compile_select(
    table: &str,
    query: &ODataQuery,
    columns: &[ColumnDescriptor],
    limits: &ODataLimits,
) -> Result<CompiledQuery, Error> {
    let projected: Vec<String> = match query.selected_fields() {
        Some(fields) => fields
            .iter()
            .map(|f| resolve_column(f, columns).map(quote_ident))
            .collect::<Result<_, _>>()?,
        None => columns.iter().map(|c| quote_ident(&c.name)).collect(),
    };

    let mut sql = format!(
        "SELECT {} FROM {}",
        projected.join(", "),
        quote_ident(table)
    );
    let mut params = Vec::new();

    if let Some(expr) = query.filter() {
        let node = resolve_filter(expr, columns)?;
        sql.push_str(" WHERE ");
        render_node(&node, &mut sql, &mut params);
    }

    if !query.order.is_empty() {
        let keys: Vec<String> = query
            .order
            .0
            .iter()
            .map(|key| {
                resolve_column(&key.field, columns).map(|name| {
                    let dir = match key.dir {
                        SortDir::Asc => "ASC",
                        SortDir::Desc => "DESC",
                    };
                    format!("{} {dir}", quote_ident(name))
                })
            })
            .collect::<Result<_, _>>()?;
        sql.push_str(" ORDER BY ");
        sql.push_str(&keys.join(", "));
    }

    let limit = limits.effective_limit(query.top);
    sql.push_str(&format!(" LIMIT {limit}"));

    let skip = query.skip_or_zero();
    if skip > 0 {
        sql.push_str(&format!(" OFFSET {skip}"));
    }

    Ok(CompiledQuery { sql, params })
}

/// Compile the companion `$count` statement: same `WHERE` clause and
/// parameters, `SELECT COUNT(*)`, no `LIMIT`/`OFFSET`/`ORDER BY`.
///
/// # Errors
/// Same field-resolution errors as [`compile_select`].
pub fn compile_count(
    table: &str,
    query: &ODataQuery,
    columns: &[ColumnDescriptor],
) -> Result<CompiledQuery, Error> {
    let mut sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let mut params = Vec::new();

    if let Some(expr) = query.filter() {
        let node = resolve_filter(expr, columns)?;
        sql.push_str(" WHERE ");
        render_node(&node, &mut sql, &mut params);
    }

    Ok(CompiledQuery { sql, params })
}

/// Look up a `$select`/`$orderby` field among the described columns,
/// case-insensitively, returning the canonical name.
fn resolve_column<'a>(name: &str, columns: &'a [ColumnDescriptor]) -> Result<&'a str, Error> {
    columns
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .map(|c| c.name.as_str())
        .ok_or_else(|| Error::UnknownField(name.to_owned()))
}

/// Quote an identifier so it never collides with reserved words; embedded
/// quotes are doubled.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn render_node(node: &FilterNode, sql: &mut String, params: &mut Vec<SqlParam>) {
    match node {
        FilterNode::Binary { field, op, value } => {
            render_binary(field, *op, value, sql, params);
        }
        FilterNode::Composite { op, children } => {
            let joiner = match op {
                FilterOp::Or => " OR ",
                _ => " AND ",
            };
            sql.push('(');
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    sql.push_str(joiner);
                }
                render_node(child, sql, params);
            }
            sql.push(')');
        }
        FilterNode::Not(inner) => {
            sql.push_str("NOT (");
            render_node(inner, sql, params);
            sql.push(')');
        }
    }
}

fn render_binary(
    field: &str,
    op: FilterOp,
    value: &Value,
    sql: &mut String,
    params: &mut Vec<SqlParam>,
) {
    let ident = quote_ident(field);

    // Null equality needs IS [NOT] NULL; `= NULL` never matches
    if matches!(value, Value::Null) {
        match op {
            FilterOp::Eq => {
                sql.push_str(&format!("{ident} IS NULL"));
                return;
            }
            FilterOp::Ne => {
                sql.push_str(&format!("{ident} IS NOT NULL"));
                return;
            }
            _ => {}
        }
    }

    match op {
        FilterOp::Contains => {
            sql.push_str(&format!("{ident} LIKE ? ESCAPE '\\'"));
            params.push(SqlParam::Text(like_pattern("%", value, "%")));
        }
        FilterOp::StartsWith => {
            sql.push_str(&format!("{ident} LIKE ? ESCAPE '\\'"));
            params.push(SqlParam::Text(like_pattern("", value, "%")));
        }
        FilterOp::EndsWith => {
            sql.push_str(&format!("{ident} LIKE ? ESCAPE '\\'"));
            params.push(SqlParam::Text(like_pattern("%", value, "")));
        }
        _ => {
            let sym = match op {
                FilterOp::Ne => "!=",
                FilterOp::Gt => ">",
                FilterOp::Ge => ">=",
                FilterOp::Lt => "<",
                FilterOp::Le => "<=",
                _ => "=",
            };
            sql.push_str(&format!("{ident} {sym} ?"));
            params.push(SqlParam::from(value));
        }
    }
}

/// Build a LIKE pattern from a string literal, escaping the wildcard
/// characters so the literal matches itself.
fn like_pattern(prefix: &str, value: &Value, suffix: &str) -> String {
    let raw = match value {
        Value::String(s) => s.as_str(),
        // resolve_filter only admits string literals into pattern ops
        _ => "",
    };
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    format!("{prefix}{escaped}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablegate_odata::schema::WarehouseType;

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("Date", WarehouseType::Date, 0),
            ColumnDescriptor::new("Media", WarehouseType::String, 1),
            ColumnDescriptor::new("Campaign", WarehouseType::String, 2),
            ColumnDescriptor::new("Clicks", WarehouseType::Integer, 3),
        ]
    }

    fn query(pairs: Vec<(&str, &str)>) -> ODataQuery {
        ODataQuery::from_pairs(pairs, &ODataLimits::default()).unwrap()
    }

    #[test]
    fn equality_filter_compiles_to_bound_parameter() {
        let q = query(vec![("$filter", "Media eq 'Naver'")]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert!(
            compiled.sql.contains("WHERE \"Media\" = ?"),
            "sql was: {}",
            compiled.sql
        );
        assert_eq!(compiled.params, vec![SqlParam::Text("Naver".to_owned())]);
    }

    #[test]
    fn conjunction_binds_parameters_in_source_order() {
        let q = query(vec![("$filter", "Clicks gt 100 and Media eq 'Naver'")]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert!(compiled.sql.contains("\"Clicks\" > ?"));
        assert!(compiled.sql.contains(" AND "));
        assert!(compiled.sql.contains("\"Media\" = ?"));
        assert_eq!(
            compiled.params,
            vec![SqlParam::Int(100), SqlParam::Text("Naver".to_owned())]
        );
    }

    #[test]
    fn no_literal_ever_lands_in_sql_text() {
        let q = query(vec![(
            "$filter",
            "Media eq 'Naver' or (Clicks ge 777 and not contains(Campaign, 'brand'))",
        )]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert!(!compiled.sql.contains("Naver"));
        assert!(!compiled.sql.contains("777"));
        assert!(!compiled.sql.contains("brand"));
        assert_eq!(compiled.params.len(), 3);
    }

    #[test]
    fn select_restricts_columns_and_keeps_requested_order() {
        let q = query(vec![("$select", "Clicks,Date")]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert!(compiled.sql.starts_with("SELECT \"Clicks\", \"Date\" FROM \"AdReport\""));
    }

    #[test]
    fn absent_select_lists_all_columns_in_descriptor_order() {
        let q = ODataQuery::new();
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert!(
            compiled
                .sql
                .starts_with("SELECT \"Date\", \"Media\", \"Campaign\", \"Clicks\" FROM")
        );
    }

    #[test]
    fn unknown_select_field_is_a_client_error() {
        let q = query(vec![("$select", "Impressions")]);
        let err = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap_err();
        assert_eq!(err, Error::UnknownField("Impressions".to_owned()));
    }

    #[test]
    fn orderby_defaults_to_ascending() {
        let q = query(vec![("$orderby", "Date desc, Campaign")]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert!(
            compiled
                .sql
                .contains("ORDER BY \"Date\" DESC, \"Campaign\" ASC")
        );
    }

    #[test]
    fn unknown_orderby_field_is_a_client_error() {
        let q = query(vec![("$orderby", "Impressions desc")]);
        let err = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap_err();
        assert_eq!(err, Error::UnknownField("Impressions".to_owned()));
    }

    #[test]
    fn top_and_skip_compile_exactly() {
        let q = query(vec![("$top", "10"), ("$skip", "20")]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert!(compiled.sql.ends_with("LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn top_above_max_is_clamped() {
        let q = query(vec![("$top", "5000")]);
        let limits = ODataLimits::default().with_max_page_size(1000);
        let compiled = compile_select("AdReport", &q, &columns(), &limits).unwrap();
        assert!(compiled.sql.ends_with("LIMIT 1000"));
    }

    #[test]
    fn top_zero_returns_no_rows() {
        let q = query(vec![("$top", "0")]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert!(compiled.sql.ends_with("LIMIT 0"));
    }

    #[test]
    fn absent_top_uses_configured_page_size() {
        let q = ODataQuery::new();
        let limits = ODataLimits::default().with_max_page_size(250);
        let compiled = compile_select("AdReport", &q, &columns(), &limits).unwrap();
        assert!(compiled.sql.ends_with("LIMIT 250"));
    }

    #[test]
    fn count_statement_shares_where_but_drops_paging() {
        let q = query(vec![
            ("$filter", "Clicks gt 100"),
            ("$orderby", "Date desc"),
            ("$top", "10"),
            ("$skip", "20"),
        ]);
        let compiled = compile_count("AdReport", &q, &columns()).unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT COUNT(*) FROM \"AdReport\" WHERE \"Clicks\" > ?"
        );
        assert_eq!(compiled.params, vec![SqlParam::Int(100)]);
    }

    #[test]
    fn string_functions_compile_to_escaped_like() {
        let q = query(vec![("$filter", "contains(Campaign, '50%_off')")]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert!(compiled.sql.contains("\"Campaign\" LIKE ? ESCAPE '\\'"));
        assert_eq!(
            compiled.params,
            vec![SqlParam::Text("%50\\%\\_off%".to_owned())]
        );
    }

    #[test]
    fn startswith_and_endswith_anchor_the_pattern() {
        let q = query(vec![("$filter", "startswith(Media, 'Na')")]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert_eq!(compiled.params, vec![SqlParam::Text("Na%".to_owned())]);

        let q = query(vec![("$filter", "endswith(Media, 'ver')")]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert_eq!(compiled.params, vec![SqlParam::Text("%ver".to_owned())]);
    }

    #[test]
    fn null_comparisons_use_is_null() {
        let q = query(vec![("$filter", "Media eq null")]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert!(compiled.sql.contains("\"Media\" IS NULL"));
        assert!(compiled.params.is_empty());

        let q = query(vec![("$filter", "Media ne null")]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert!(compiled.sql.contains("\"Media\" IS NOT NULL"));
    }

    #[test]
    fn not_wraps_its_operand() {
        let q = query(vec![("$filter", "not Media eq 'Naver'")]);
        let compiled = compile_select("AdReport", &q, &columns(), &ODataLimits::default()).unwrap();
        assert!(compiled.sql.contains("NOT (\"Media\" = ?)"));
    }

    #[test]
    fn reserved_word_columns_are_quoted() {
        let cols = vec![ColumnDescriptor::new("select", WarehouseType::String, 0)];
        let q = query(vec![("$filter", "select eq 'x'")]);
        let compiled = compile_select("order", &q, &cols, &ODataLimits::default()).unwrap();
        assert!(compiled.sql.contains("FROM \"order\""));
        assert!(compiled.sql.contains("\"select\" = ?"));
    }
}
