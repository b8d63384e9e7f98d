use crate::Parser;
use serde_json::Value;
use siem_schema::RawEvent;

/// Passthrough parser for already-structured events (§4.2): if the raw
/// event already carries `@timestamp`, it's used as-is; otherwise `message`
/// is tried as a JSON document; failing that the raw event is returned
/// unchanged rather than dropped.
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, raw: &RawEvent) -> Option<Value> {
        if raw.extra.contains_key("@timestamp") {
            return Some(raw.as_value());
        }
        if let Ok(parsed) = serde_json::from_str::<Value>(&raw.message) {
            if parsed.is_object() {
                return Some(parsed);
            }
        }
        Some(raw.as_value())
    }
}
