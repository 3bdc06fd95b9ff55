/// Dotted key paths (`servers.0.url`) over configuration documents.
use serde_json::{Map, Value};

use crate::errors::{FlowctlError, Result};

/// Look up a dotted path. Numeric segments index into lists.
#[must_use]
pub fn get_path<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Set a dotted path, creating intermediate mappings as needed. A list index
/// must exist, or equal the list length to append.
///
/// # Errors
///
/// Returns `FlowctlError::Config` when the path is empty, indexes past the
/// end of a list, or descends into a scalar.
pub fn set_path(value: &mut Value, key: &str, new_value: Value) -> Result<()> {
    let invalid = |reason: &str| FlowctlError::Config(format!("Invalid key `{key}`: {reason}"));

    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid("empty segment"));
    }
    let Some((last, parents)) = segments.split_last() else {
        return Err(invalid("empty key"));
    };

    let mut current = value;
    for segment in parents {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry((*segment).to_owned())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => {
                let index = list_index(segment).ok_or_else(|| invalid("expected a list index"))?;
                items
                    .get_mut(index)
                    .ok_or_else(|| invalid("list index out of range"))?
            }
            _ => return Err(invalid("cannot set a field on a scalar")),
        };
    }

    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => {
            map.insert((*last).to_owned(), new_value);
        }
        Value::Array(items) => {
            let index = list_index(last).ok_or_else(|| invalid("expected a list index"))?;
            match index.cmp(&items.len()) {
                std::cmp::Ordering::Less => items[index] = new_value,
                std::cmp::Ordering::Equal => items.push(new_value),
                std::cmp::Ordering::Greater => return Err(invalid("list index out of range")),
            }
        }
        _ => return Err(invalid("cannot set a field on a scalar")),
    }

    Ok(())
}

fn list_index(segment: &str) -> Option<usize> {
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_path() {
        let doc = json!({"servers": [{"name": "a", "url": "http://a"}], "current_server": "a"});
        assert_eq!(get_path(&doc, "servers.0.name"), Some(&json!("a")));
        assert_eq!(get_path(&doc, "current_server"), Some(&json!("a")));
        assert_eq!(get_path(&doc, "servers.3.name"), None);
        assert_eq!(get_path(&doc, "current_server.x"), None);
    }

    #[test]
    fn test_set_path_replaces_and_appends() {
        let mut doc = json!({"servers": [{"name": "a"}]});
        set_path(&mut doc, "servers.0.name", json!("b")).unwrap();
        set_path(&mut doc, "servers.1", json!({"name": "c"})).unwrap();
        set_path(&mut doc, "extra.deep.key", json!(1)).unwrap();
        assert_eq!(
            doc,
            json!({"servers": [{"name": "b"}, {"name": "c"}], "extra": {"deep": {"key": 1}}})
        );
    }

    #[test]
    fn test_set_path_errors() {
        let mut doc = json!({"servers": [], "current_server": "a"});
        assert!(set_path(&mut doc, "servers.5", json!(1)).is_err());
        assert!(set_path(&mut doc, "servers.name", json!(1)).is_err());
        assert!(set_path(&mut doc, "current_server.x", json!(1)).is_err());
        assert!(set_path(&mut doc, "a..b", json!(1)).is_err());
    }
}
