use serde_json::Value;

/// Reads a dotted path (`"source.geo.country_iso_code"`) out of a JSON object
/// tree. Absence is a first-class result, never coerced to a zero value: a
/// missing path and a path whose value is JSON `null` are both `None` for the
/// purposes of rule matching (the distinction only matters to callers that
/// care about "is the key present at all", which rule matching does not).
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Sets a dotted path in a JSON object tree, creating intermediate objects as
/// needed. Used by parsers and enrichers to populate namespaced fields
/// without the caller hand-rolling nested `serde_json::Map` inserts.
pub fn set_path(root: &mut Value, path: &str, new_value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = root;
    for segment in &segments[..segments.len() - 1] {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let map = current.as_object_mut().expect("just ensured object");
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
    if !current.is_object() {
        *current = Value::Object(serde_json::Map::new());
    }
    current
        .as_object_mut()
        .expect("just ensured object")
        .insert(segments[segments.len() - 1].to_string(), new_value);
}

/// Stringifies a dotted-path lookup for group-key construction; an absent
/// path reads as the literal `"null"`, matching the rule-groupby semantics.
pub fn group_key_part(value: Option<&Value>) -> String {
    match value {
        None => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Builds a `:`-joined group key from a list of dotted paths evaluated
/// against an event.
pub fn group_key(event: &Value, fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| group_key_part(get_path(event, f)))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_nested_path() {
        let v = json!({"source": {"ip": "1.2.3.4", "geo": {"country_name": "US"}}});
        assert_eq!(get_path(&v, "source.ip").unwrap(), "1.2.3.4");
        assert_eq!(get_path(&v, "source.geo.country_name").unwrap(), "US");
    }

    #[test]
    fn missing_path_is_none() {
        let v = json!({"source": {"ip": "1.2.3.4"}});
        assert!(get_path(&v, "destination.ip").is_none());
        assert!(get_path(&v, "source.port").is_none());
        assert!(get_path(&v, "a.b.c.d").is_none());
    }

    #[test]
    fn null_value_is_none() {
        let v = json!({"source": {"ip": null}});
        assert!(get_path(&v, "source.ip").is_none());
    }

    #[test]
    fn non_object_intermediate_is_none() {
        let v = json!({"source": "not-an-object"});
        assert!(get_path(&v, "source.ip").is_none());
    }

    #[test]
    fn set_path_creates_intermediate_objects() {
        let mut v = json!({});
        set_path(&mut v, "source.geo.country_name", json!("US"));
        assert_eq!(get_path(&v, "source.geo.country_name").unwrap(), "US");
    }

    #[test]
    fn group_key_joins_with_colon_and_null_literal() {
        let v = json!({"source": {"ip": "10.0.0.9"}});
        let key = group_key(&v, &["source.ip".to_string(), "destination.port".to_string()]);
        assert_eq!(key, "10.0.0.9:null");
    }
}
