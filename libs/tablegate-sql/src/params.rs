//! Bound-parameter values passed alongside a compiled statement.

use bigdecimal::{BigDecimal, ToPrimitive};

use tablegate_odata::ast::Value;

/// A single bound parameter, in statement order.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(BigDecimal),
    Text(String),
}

impl From<&Value> for SqlParam {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Bool(*b),
            Value::Number(n) => from_number(n),
            Value::String(s) => SqlParam::Text(s.clone()),
        }
    }
}

/// Integral literals that fit an `i64` bind as integers so warehouses with
/// strict numeric typing compare them against integer columns directly.
fn from_number(n: &BigDecimal) -> SqlParam {
    if n.is_integer()
        && let Some(i) = n.to_i64()
    {
        return SqlParam::Int(i);
    }
    SqlParam::Decimal(n.clone())
}
