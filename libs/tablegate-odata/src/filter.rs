//! Validation of raw filter expressions against a column set.
//!
//! The parser is schema-agnostic; this pass resolves every identifier to a
//! known column (case-insensitively), rejects shapes the SQL compiler cannot
//! handle (field-to-field comparisons, bare identifiers or literals used as
//! boolean expressions) and folds the three supported string functions into
//! pattern-match comparisons. Literal/column type mismatches are deliberately
//! NOT rejected here: they pass through and surface as warehouse execution
//! errors, which keeps this pass testable without a live schema.

use std::fmt;

use crate::Error;
use crate::ast::{CompareOperator, Expr, Value};
use crate::schema::ColumnDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    StartsWith,
    EndsWith,
    And,
    Or,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Ge => "ge",
            FilterOp::Lt => "lt",
            FilterOp::Le => "le",
            FilterOp::Contains => "contains",
            FilterOp::StartsWith => "startswith",
            FilterOp::EndsWith => "endswith",
            FilterOp::And => "and",
            FilterOp::Or => "or",
        };
        write!(f, "{s}")
    }
}

impl From<CompareOperator> for FilterOp {
    fn from(op: CompareOperator) -> Self {
        match op {
            CompareOperator::Eq => FilterOp::Eq,
            CompareOperator::Ne => FilterOp::Ne,
            CompareOperator::Gt => FilterOp::Gt,
            CompareOperator::Ge => FilterOp::Ge,
            CompareOperator::Lt => FilterOp::Lt,
            CompareOperator::Le => FilterOp::Le,
        }
    }
}

/// Filter expression with every field resolved to its canonical column name.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Binary {
        field: String,
        op: FilterOp,
        value: Value,
    },
    Composite {
        op: FilterOp,
        children: Vec<FilterNode>,
    },
    Not(Box<FilterNode>),
}

impl FilterNode {
    pub fn binary(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        FilterNode::Binary {
            field: field.into(),
            op,
            value,
        }
    }

    #[must_use]
    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::Composite {
            op: FilterOp::And,
            children,
        }
    }

    #[must_use]
    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Composite {
            op: FilterOp::Or,
            children,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: FilterNode) -> Self {
        FilterNode::Not(Box::new(inner))
    }
}

/// Resolve a parsed expression into a [`FilterNode`] against known columns.
///
/// # Errors
/// Returns [`Error::UnknownField`] for identifiers not in `columns`,
/// [`Error::UnsupportedOperator`] for functions outside
/// `contains`/`startswith`/`endswith`, and [`Error::FilterSyntax`]-free
/// structural errors ([`Error::UnsupportedOperator`]) for comparison shapes
/// the compiler cannot express.
pub fn resolve_filter(expr: &Expr, columns: &[ColumnDescriptor]) -> Result<FilterNode, Error> {
    match expr {
        Expr::And(left, right) => {
            let left_node = resolve_filter(left, columns)?;
            let right_node = resolve_filter(right, columns)?;
            Ok(FilterNode::and(vec![left_node, right_node]))
        }
        Expr::Or(left, right) => {
            let left_node = resolve_filter(left, columns)?;
            let right_node = resolve_filter(right, columns)?;
            Ok(FilterNode::or(vec![left_node, right_node]))
        }
        Expr::Not(inner) => {
            let inner_node = resolve_filter(inner, columns)?;
            Ok(FilterNode::not(inner_node))
        }

        Expr::Compare(left, op, right) => {
            let (field_name, value) = match (&**left, &**right) {
                (Expr::Identifier(name), Expr::Value(val)) => (name.as_str(), val.clone()),
                (Expr::Identifier(_), Expr::Identifier(_)) => {
                    return Err(Error::UnsupportedOperator(
                        "field-to-field comparison".to_owned(),
                    ));
                }
                _ => {
                    return Err(Error::UnsupportedOperator(
                        "comparison must be between a field and a literal".to_owned(),
                    ));
                }
            };

            let field = resolve_field(field_name, columns)?;
            Ok(FilterNode::binary(field, FilterOp::from(*op), value))
        }

        Expr::Function(func_name, args) => {
            let op = match func_name.to_ascii_lowercase().as_str() {
                "contains" => FilterOp::Contains,
                "startswith" => FilterOp::StartsWith,
                "endswith" => FilterOp::EndsWith,
                _ => {
                    return Err(Error::UnsupportedOperator(format!(
                        "function '{func_name}'"
                    )));
                }
            };
            let [Expr::Identifier(field_name), Expr::Value(Value::String(s))] = args.as_slice()
            else {
                return Err(Error::UnsupportedOperator(format!(
                    "{func_name} expects (field, 'literal')"
                )));
            };
            let field = resolve_field(field_name, columns)?;
            Ok(FilterNode::binary(field, op, Value::String(s.clone())))
        }

        Expr::Identifier(name) => Err(Error::UnsupportedOperator(format!(
            "bare identifier '{name}' cannot be used as a condition"
        ))),
        Expr::Value(_) => Err(Error::UnsupportedOperator(
            "bare literal cannot be used as a condition".to_owned(),
        )),
    }
}

/// Look up a referenced field among the known columns, case-insensitively,
/// returning the canonical column name.
fn resolve_field(name: &str, columns: &[ColumnDescriptor]) -> Result<String, Error> {
    columns
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .map(|c| c.name.clone())
        .ok_or_else(|| Error::UnknownField(name.to_owned()))
}

/// Parse and resolve in one step: the contract of the filter subsystem.
///
/// # Errors
/// Propagates syntax errors from [`crate::parser::parse_filter`] and
/// resolution errors from [`resolve_filter`].
pub fn parse_and_resolve(raw: &str, columns: &[ColumnDescriptor]) -> Result<FilterNode, Error> {
    let expr = crate::parser::parse_filter(raw)?;
    resolve_filter(&expr, columns)
}
