use crate::event::{Event, ECS_VERSION};
use chrono::Utc;
use serde_json::{Map, Value};

/// Top-level keys the schema mapper is willing to carry over from a parsed
/// event into the ECS shape. Anything else is dropped (§4.3) except the
/// three special-cased fields below.
const KNOWN_NAMESPACES: &[&str] = &[
    "event",
    "source",
    "destination",
    "host",
    "user",
    "process",
    "network",
    "http",
    "url",
    "user_agent",
    "dns",
    "file",
    "threat",
];

/// Projects a parser's output into the fixed ECS event shape. Idempotent:
/// mapping an already-mapped event reproduces it, since every field the
/// mapper reads from is also a field it writes back unchanged.
pub fn map(parsed: Value) -> Event {
    let mut out = Map::new();

    let timestamp = parsed
        .get("@timestamp")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Utc::now().to_rfc3339());
    out.insert("@timestamp".to_string(), Value::String(timestamp));

    let mut ecs = Map::new();
    ecs.insert("version".to_string(), Value::String(ECS_VERSION.to_string()));
    out.insert("ecs".to_string(), Value::Object(ecs));

    for namespace in KNOWN_NAMESPACES {
        if let Some(value) = parsed.get(*namespace) {
            out.insert(namespace.to_string(), value.clone());
        }
    }

    if let Some(message) = parsed.get("message") {
        out.insert("message".to_string(), message.clone());
    }
    if let Some(tags) = parsed.get("tags") {
        out.insert("tags".to_string(), tags.clone());
    }
    if let Some(metadata) = parsed.get("@metadata") {
        out.insert("@metadata".to_string(), metadata.clone());
    }

    Event::from_value(Value::Object(out))
}
