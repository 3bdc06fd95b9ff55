/// JMESPath selection over result records, with a `timedelta` extension.
use chrono::{DateTime, Utc};
use jmespath::functions::{ArgumentType, CustomFunction, Signature};
use jmespath::{Context, Rcvar, Runtime, Variable};
use serde_json::Value;

use crate::errors::{FlowctlError, Result};
use crate::render::humanize::parse_timestamp;

/// Evaluate `expression` against `data`.
///
/// Besides the builtin functions, `timedelta(left, right)` returns
/// `left - right` in seconds, where each side is an ISO timestamp or Unix
/// seconds. It yields `null` when either side is not a date.
///
/// # Errors
///
/// Returns `FlowctlError::Query` when the expression does not compile or
/// fails at evaluation.
pub fn select(expression: &str, data: &Value) -> Result<Value> {
    let runtime = runtime();
    let compiled = runtime
        .compile(expression)
        .map_err(|e| FlowctlError::Query(e.to_string()))?;
    let found = compiled
        .search(data.clone())
        .map_err(|e| FlowctlError::Query(e.to_string()))?;
    Ok(serde_json::to_value(&*found)?)
}

/// Whether a selection result counts as "nothing found".
#[must_use]
pub fn is_empty_selection(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn runtime() -> Runtime {
    let mut runtime = Runtime::new();
    runtime.register_builtin_functions();

    let date = || ArgumentType::Union(vec![ArgumentType::String, ArgumentType::Number]);
    runtime.register_function(
        "timedelta",
        Box::new(CustomFunction::new(
            Signature::new(vec![date(), date()], None),
            Box::new(|args: &[Rcvar], _: &mut Context<'_>| {
                let seconds = match (as_datetime(&args[0]), as_datetime(&args[1])) {
                    (Some(left), Some(right)) => seconds_between(left, right),
                    _ => None,
                };
                Ok(Rcvar::new(
                    seconds
                        .and_then(serde_json::Number::from_f64)
                        .map_or(Variable::Null, Variable::Number),
                ))
            }),
        )),
    );

    runtime
}

fn as_datetime(var: &Variable) -> Option<DateTime<Utc>> {
    match var {
        Variable::String(s) => parse_timestamp(s),
        #[allow(clippy::cast_possible_truncation)]
        Variable::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn seconds_between(left: DateTime<Utc>, right: DateTime<Utc>) -> Option<f64> {
    let delta = left - right;
    let micros = delta.num_microseconds()?;
    Some(micros as f64 / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_field() {
        let data = json!([{"metadata": {"name": "a"}}, {"metadata": {"name": "b"}}]);
        assert_eq!(select("[].metadata.name", &data).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_select_builtin_function() {
        let data = json!({"items": [1, 2, 3]});
        assert_eq!(select("length(items)", &data).unwrap().as_f64(), Some(3.0));
    }

    #[test]
    fn test_timedelta_iso_strings() {
        let data = json!({"started_at": "2024-05-01T10:00:00", "finished_at": "2024-05-01T10:01:30"});
        let seconds = select("timedelta(finished_at, started_at)", &data).unwrap();
        assert_eq!(seconds.as_f64(), Some(90.0));
    }

    #[test]
    fn test_timedelta_unix_seconds() {
        let data = json!({"a": 100, "b": 40});
        assert_eq!(select("timedelta(a, b)", &data).unwrap().as_f64(), Some(60.0));
    }

    #[test]
    fn test_timedelta_non_date_is_null() {
        let data = json!({"a": "soon", "b": "2024-05-01T10:00:00"});
        assert_eq!(select("timedelta(a, b)", &data).unwrap(), Value::Null);
    }

    #[test]
    fn test_invalid_expression_is_query_error() {
        assert!(matches!(select("[?", &json!({})), Err(FlowctlError::Query(_))));
    }

    #[test]
    fn test_is_empty_selection() {
        assert!(is_empty_selection(&Value::Null));
        assert!(is_empty_selection(&json!([])));
        assert!(!is_empty_selection(&json!(0)));
        assert!(!is_empty_selection(&json!([1])));
    }
}
