/// Free-form trailing arguments (`--key value`) turned into nested records,
/// plus the deep merge used to apply them as patches.
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::errors::{FlowctlError, Result};

/// Matches key segments: word runs and bracketed indices (`[3]`, `[]`).
static KEY_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+|\[\d*\])").expect("static regex is valid"));

/// Most `null` slots an explicit index may add past the end of a list.
const MAX_INDEX_PADDING: usize = 1000;

/// One segment of a nested key such as `inputs.items[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySegment {
    /// Mapping key.
    Key(String),
    /// Explicit list index.
    Index(usize),
    /// `[]`: append to the list.
    Append,
}

impl KeySegment {
    fn wants_list(&self) -> bool {
        matches!(self, Self::Index(_) | Self::Append)
    }

    fn empty_container(&self) -> Value {
        if self.wants_list() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        }
    }
}

/// Positional tokens and nested keyword arguments from trailing CLI input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pub args: Vec<String>,
    pub kwargs: Map<String, Value>,
}

impl Params {
    /// Parse trailing tokens. A token starting with `-` is a key and the
    /// following token is its value (`null` when the input ends).
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::InvalidArguments` for keys that cannot be
    /// parsed or that address a list as a mapping (or vice versa).
    pub fn parse(tokens: &[String]) -> Result<Self> {
        let mut params = Self::default();
        let mut iter = tokens.iter();

        while let Some(token) = iter.next() {
            if let Some(raw_key) = token.strip_prefix('-') {
                let raw_key = raw_key.trim_start_matches('-');
                let segments = parse_key(raw_key)?;
                let value = iter
                    .next()
                    .map_or(Value::Null, |v| Value::String(v.clone()));
                set_nested_value(&mut params.kwargs, &segments, value)?;
            } else {
                params.args.push(token.clone());
            }
        }

        Ok(params)
    }

    /// Keyword arguments with string leaves coerced to JSON literals.
    #[must_use]
    pub fn coerced_kwargs(&self) -> Map<String, Value> {
        self.kwargs
            .iter()
            .map(|(k, v)| (k.clone(), coerce_value(v)))
            .collect()
    }

    /// Remove a keyword argument and return it as a string, if present.
    pub fn take_string(&mut self, key: &str) -> Option<String> {
        self.kwargs.remove(key).map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }
}

/// Split a key like `spec.stages[0].name` into segments.
///
/// # Errors
///
/// Returns `FlowctlError::InvalidArguments` when no segment can be found.
pub fn parse_key(key: &str) -> Result<Vec<KeySegment>> {
    let segments: Vec<KeySegment> = KEY_SEGMENT
        .find_iter(key)
        .map(|m| {
            let s = m.as_str();
            if s == "[]" {
                KeySegment::Append
            } else if let Some(inner) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                inner
                    .parse()
                    .map_or_else(|_| KeySegment::Key(s.to_owned()), KeySegment::Index)
            } else {
                KeySegment::Key(s.to_owned())
            }
        })
        .collect();

    if segments.is_empty() {
        return Err(FlowctlError::InvalidArguments(format!(
            "Invalid argument key: `{key}`"
        )));
    }
    Ok(segments)
}

/// Assign `value` at the nested position `segments` inside `root`.
///
/// Missing containers are created (a list when the next segment is an index,
/// a mapping otherwise). Assigning a plain key whose current value is a list
/// appends instead of replacing.
///
/// # Errors
///
/// Returns `FlowctlError::InvalidArguments` on list/mapping mismatches.
pub fn set_nested_value(
    root: &mut Map<String, Value>,
    segments: &[KeySegment],
    value: Value,
) -> Result<()> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(());
    };
    let KeySegment::Key(first_key) = first else {
        return Err(FlowctlError::InvalidArguments(
            "Argument keys must start with a name".to_owned(),
        ));
    };

    if rest.is_empty() {
        match root.get_mut(first_key) {
            Some(Value::Array(items)) => items.push(value),
            _ => {
                root.insert(first_key.clone(), value);
            }
        }
        return Ok(());
    }

    let slot = root
        .entry(first_key.clone())
        .or_insert_with(|| rest[0].empty_container());
    if slot.is_null() {
        *slot = rest[0].empty_container();
    }
    set_in_value(slot, rest, value)
}

fn set_in_value(current: &mut Value, segments: &[KeySegment], value: Value) -> Result<()> {
    let (segment, rest) = segments
        .split_first()
        .ok_or_else(|| FlowctlError::InvalidArguments("Empty argument key".to_owned()))?;

    match (current, segment) {
        (Value::Object(map), KeySegment::Key(key)) => {
            if rest.is_empty() {
                match map.get_mut(key) {
                    Some(Value::Array(items)) => items.push(value),
                    _ => {
                        map.insert(key.clone(), value);
                    }
                }
                return Ok(());
            }
            let slot = map
                .entry(key.clone())
                .or_insert_with(|| rest[0].empty_container());
            if slot.is_null() {
                *slot = rest[0].empty_container();
            }
            set_in_value(slot, rest, value)
        }
        (Value::Array(items), KeySegment::Index(_) | KeySegment::Append) => {
            let index = match segment {
                KeySegment::Index(i) => *i,
                _ => items.len(),
            };
            if items.len() <= index {
                let new_len = index
                    .checked_add(1)
                    .filter(|_| index - items.len() <= MAX_INDEX_PADDING)
                    .ok_or_else(|| {
                        FlowctlError::InvalidArguments(format!(
                            "List index {index} is too far past the end of a list of {} items",
                            items.len()
                        ))
                    })?;
                items.resize(new_len, Value::Null);
            }
            if rest.is_empty() {
                items[index] = value;
                return Ok(());
            }
            if items[index].is_null() {
                items[index] = rest[0].empty_container();
            }
            set_in_value(&mut items[index], rest, value)
        }
        (other, segment) => Err(FlowctlError::InvalidArguments(format!(
            "Cannot set {segment:?} on a {} value",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// Coerce string leaves to JSON literals (numbers, booleans, null, lists,
/// mappings). Strings that are not valid JSON stay strings.
#[must_use]
pub fn coerce_value(value: &Value) -> Value {
    match value {
        Value::String(s) => coerce_str(s),
        Value::Array(items) => Value::Array(items.iter().map(coerce_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), coerce_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Parse a single CLI string as a JSON literal, falling back to a string.
#[must_use]
pub fn coerce_str(raw: &str) -> Value {
    serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Recursively merge `patch` into `base`.
///
/// Mappings merge key by key; lists merge index-wise (see [`merge_lists`]);
/// anything else in `patch` replaces the value in `base`.
#[must_use]
pub fn deep_merge(base: &Map<String, Value>, patch: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();

    for (key, new_value) in patch {
        let combined = match (merged.get(key), new_value) {
            (Some(Value::Object(old)), Value::Object(new)) => Value::Object(deep_merge(old, new)),
            (Some(Value::Array(old)), Value::Array(new)) => Value::Array(merge_lists(old, new)),
            _ => new_value.clone(),
        };
        merged.insert(key.clone(), combined);
    }

    merged
}

/// Merge two lists index-wise: mappings at the same index are deep merged,
/// other non-null items replace, extra items are appended.
#[must_use]
pub fn merge_lists(base: &[Value], patch: &[Value]) -> Vec<Value> {
    let mut merged = base.to_vec();

    for (i, new_item) in patch.iter().enumerate() {
        if i < merged.len() {
            match (&merged[i], new_item) {
                (Value::Object(old), Value::Object(new)) => {
                    merged[i] = Value::Object(deep_merge(old, new));
                }
                (_, Value::Null) => {}
                _ => merged[i] = new_item.clone(),
            }
        } else {
            merged.push(new_item.clone());
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_parse_nested_and_append() {
        let params = Params::parse(&tokens(&[
            "first", "--a.b", "1", "--items[]", "x", "--items[]", "y",
        ]))
        .unwrap();
        assert_eq!(params.args, vec!["first".to_owned()]);
        assert_eq!(
            Value::Object(params.kwargs),
            json!({"a": {"b": "1"}, "items": ["x", "y"]})
        );
    }

    #[test]
    fn test_parse_explicit_index_pads_with_null() {
        let params = Params::parse(&tokens(&["--l[2].name", "z"])).unwrap();
        assert_eq!(
            Value::Object(params.kwargs),
            json!({"l": [null, null, {"name": "z"}]})
        );
    }

    #[test]
    fn test_index_far_past_end_is_rejected() {
        for key in ["--l[18446744073709551615]", "--l[99999999999]", "--l[1001]"] {
            let err = Params::parse(&tokens(&[key, "x"])).unwrap_err();
            assert!(matches!(err, FlowctlError::InvalidArguments(_)), "{key}");
        }
        let params = Params::parse(&tokens(&["--l[1000]", "x"])).unwrap();
        assert_eq!(params.kwargs["l"].as_array().map(Vec::len), Some(1001));
    }

    #[test]
    fn test_repeated_key_appends_to_existing_list() {
        let params = Params::parse(&tokens(&["--tags[]", "a", "--tags", "b"])).unwrap();
        assert_eq!(Value::Object(params.kwargs), json!({"tags": ["a", "b"]}));
    }

    #[test]
    fn test_missing_value_is_null() {
        let params = Params::parse(&tokens(&["--flag"])).unwrap();
        assert_eq!(Value::Object(params.kwargs), json!({"flag": null}));
    }

    #[test]
    fn test_mismatched_container_is_rejected() {
        let err = Params::parse(&tokens(&["--a", "1", "--a.b", "2"])).unwrap_err();
        assert!(matches!(err, FlowctlError::InvalidArguments(_)));
    }

    #[test]
    fn test_coerce_literals() {
        assert_eq!(coerce_str("5"), json!(5));
        assert_eq!(coerce_str("2.5"), json!(2.5));
        assert_eq!(coerce_str("true"), json!(true));
        assert_eq!(coerce_str("null"), Value::Null);
        assert_eq!(coerce_str("[1, 2]"), json!([1, 2]));
        assert_eq!(coerce_str("hello"), json!("hello"));
    }

    #[test]
    fn test_coerced_kwargs_are_recursive() {
        let params = Params::parse(&tokens(&["--n", "3", "--spec.enabled", "false"])).unwrap();
        assert_eq!(
            Value::Object(params.coerced_kwargs()),
            json!({"n": 3, "spec": {"enabled": false}})
        );
    }

    #[test]
    fn test_take_string() {
        let mut params = Params::parse(&tokens(&["--limit", "5"])).unwrap();
        assert_eq!(params.take_string("limit").as_deref(), Some("5"));
        assert!(params.kwargs.is_empty());
    }

    #[test]
    fn test_deep_merge() {
        let base = json!({"a": {"b": 1, "c": 2}, "l": [{"x": 1}, 2]});
        let patch = json!({"a": {"c": 3}, "l": [{"y": 2}]});
        let merged = deep_merge(base.as_object().unwrap(), patch.as_object().unwrap());
        assert_eq!(
            Value::Object(merged),
            json!({"a": {"b": 1, "c": 3}, "l": [{"x": 1, "y": 2}, 2]})
        );
    }

    #[test]
    fn test_merge_lists_skips_null_and_appends() {
        let merged = merge_lists(&[json!(1), json!(2)], &[Value::Null, json!(5), json!(6)]);
        assert_eq!(merged, vec![json!(1), json!(5), json!(6)]);
    }
}
