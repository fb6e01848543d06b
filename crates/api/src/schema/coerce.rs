use serde_json::{Number, Value};

use super::SemanticType;

/// Coerces a scalar into `ty`, accepting the textual form of every scalar type.
///
/// Path and query values always arrive as strings; JSON bodies may carry either the native
/// representation or its text. Returns `None` for non-scalar targets and for values that do not
/// convert.
pub(crate) fn coerce_scalar(value: &Value, ty: &SemanticType) -> Option<Value> {
    match (ty, value) {
        (SemanticType::Integer, Value::Number(n)) => integer_from_number(n),
        (SemanticType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
        (SemanticType::Float, Value::Number(n)) => n.as_f64().and_then(float),
        (SemanticType::Float, Value::String(s)) => s.trim().parse::<f64>().ok().and_then(float),
        (SemanticType::Boolean, Value::Bool(b)) => Some(Value::Bool(*b)),
        (SemanticType::Boolean, Value::String(s)) => boolean_from_text(s).map(Value::Bool),
        (SemanticType::String, Value::String(s)) => Some(Value::String(s.clone())),
        _ => None,
    }
}

fn integer_from_number(n: &Number) -> Option<Value> {
    if let Some(i) = n.as_i64() {
        return Some(Value::from(i));
    }
    // 3.0 is an integer, 3.5 is not
    let f = n.as_f64()?;
    if f.fract() != 0.0 || f < i64::MIN as f64 || f > i64::MAX as f64 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, reason = "range and fraction are checked above")]
    let i = f as i64;
    Some(Value::from(i))
}

fn float(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}

fn boolean_from_text(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
