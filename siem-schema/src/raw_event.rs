use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The record a collector pushes onto `events:raw`. `message` and
/// `source_type` drive parser dispatch; everything else is passthrough and
/// preserved under `extra` so a parser that wants collector-supplied
/// structured fields (e.g. the Windows parser's `winlog` block) can still
/// see them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawEvent {
    #[serde(default)]
    pub message: String,

    /// The collector's own peer address -- not the event's logical source.
    #[serde(default)]
    pub source_ip: Option<String>,

    #[serde(default)]
    pub source_type: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEvent {
    /// The parser key this event selects, defaulting to `"json"` when the
    /// producer omits `source_type` (per §4.2).
    pub fn parser_key(&self) -> &str {
        self.source_type.as_deref().unwrap_or("json")
    }

    /// Renders the whole raw event (message, source_type, extras) as a JSON
    /// value, for parsers that want to read passthrough fields by path.
    pub fn as_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parser_key_to_json() {
        let raw: RawEvent = serde_json::from_value(serde_json::json!({"message": "hi"})).unwrap();
        assert_eq!(raw.parser_key(), "json");
    }

    #[test]
    fn honors_explicit_source_type() {
        let raw: RawEvent =
            serde_json::from_value(serde_json::json!({"message": "hi", "source_type": "syslog"}))
                .unwrap();
        assert_eq!(raw.parser_key(), "syslog");
    }

    #[test]
    fn preserves_passthrough_fields() {
        let raw: RawEvent = serde_json::from_value(serde_json::json!({
            "message": "hi",
            "winlog": {"event_id": 4624}
        }))
        .unwrap();
        assert_eq!(raw.extra.get("winlog").unwrap()["event_id"], 4624);
    }
}
