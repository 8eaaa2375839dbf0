use super::BindValue;
use sieve_query::{ScalarType, Value};

pub(super) fn push_value(bind_params: &mut Vec<BindValue>, value: &Value) -> usize {
    bind_params.push(match value {
        Value::Bool(v) => BindValue::Bool(*v),
        Value::SmallInt(v) => BindValue::SmallInt(*v),
        Value::Int(v) => BindValue::Int(*v),
        Value::BigInt(v) => BindValue::BigInt(*v),
        Value::Uuid(v) => BindValue::Uuid(*v),
        Value::Text(v) => BindValue::Text(v.clone()),
    });
    bind_params.len()
}

pub(super) fn push_bigint(bind_params: &mut Vec<BindValue>, value: i64) -> usize {
    bind_params.push(BindValue::BigInt(value));
    bind_params.len()
}

/// Bind `values` as one Postgres array of `scalar_type`. Values of another
/// type are skipped; coercion has already made them uniform.
pub(super) fn push_array(
    bind_params: &mut Vec<BindValue>,
    scalar_type: ScalarType,
    values: &[Value],
) -> usize {
    let array = match scalar_type {
        ScalarType::Boolean => BindValue::BoolArray(
            values
                .iter()
                .filter_map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect(),
        ),
        ScalarType::SmallInt => BindValue::SmallIntArray(
            values
                .iter()
                .filter_map(|v| match v {
                    Value::SmallInt(n) => Some(*n),
                    _ => None,
                })
                .collect(),
        ),
        ScalarType::Integer => BindValue::IntArray(
            values
                .iter()
                .filter_map(|v| match v {
                    Value::Int(n) => Some(*n),
                    _ => None,
                })
                .collect(),
        ),
        ScalarType::BigInt => BindValue::BigIntArray(
            values
                .iter()
                .filter_map(|v| match v {
                    Value::BigInt(n) => Some(*n),
                    _ => None,
                })
                .collect(),
        ),
        ScalarType::Uuid => BindValue::UuidArray(
            values
                .iter()
                .filter_map(|v| match v {
                    Value::Uuid(u) => Some(*u),
                    _ => None,
                })
                .collect(),
        ),
        ScalarType::Text => BindValue::TextArray(
            values
                .iter()
                .filter_map(|v| match v {
                    Value::Text(s) => Some(s.clone()),
                    _ => None,
                })
                .collect(),
        ),
    };
    bind_params.push(array);
    bind_params.len()
}
