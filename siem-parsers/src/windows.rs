use crate::Parser;
use serde_json::{json, Value};
use siem_schema::RawEvent;

const AUTH_EVENT_IDS: &[i64] = &[4624, 4625, 4648, 4672, 4776];
const IAM_EVENT_IDS: &[i64] = &[4720, 4722, 4724, 4732, 4740, 4756];

fn category_for(event_id: i64) -> &'static str {
    if AUTH_EVENT_IDS.contains(&event_id) {
        "authentication"
    } else if IAM_EVENT_IDS.contains(&event_id) {
        "iam"
    } else {
        "system"
    }
}

/// Windows event log parser. Expects the raw event's passthrough fields to
/// carry a `winlog` block, as a collector reading the Windows Event Log API
/// would produce (§4.2).
pub struct WindowsParser;

impl Parser for WindowsParser {
    fn parse(&self, raw: &RawEvent) -> Option<Value> {
        let winlog = raw.extra.get("winlog")?;
        let event_id = winlog.get("event_id").and_then(Value::as_i64)?;
        let host = raw
            .extra
            .get("host")
            .and_then(|h| h.get("name"))
            .cloned()
            .unwrap_or(Value::Null);
        let user = winlog
            .get("user")
            .and_then(|u| u.get("name"))
            .cloned()
            .unwrap_or(Value::Null);
        let message = winlog
            .get("message")
            .cloned()
            .unwrap_or(Value::String(raw.message.clone()));
        let timestamp = raw.extra.get("@timestamp").cloned();

        let mut event = json!({
            "message": message,
            "host": { "hostname": host },
            "user": { "name": user },
            "event": { "category": category_for(event_id), "code": event_id },
        });
        if let Some(ts) = timestamp {
            event["@timestamp"] = ts;
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(event_id: i64) -> RawEvent {
        let mut extra = serde_json::Map::new();
        extra.insert(
            "winlog".to_string(),
            json!({"event_id": event_id, "user": {"name": "alice"}, "message": "An account was logged on"}),
        );
        extra.insert("host".to_string(), json!({"name": "dc01"}));
        RawEvent {
            message: "raw winlog blob".to_string(),
            source_ip: None,
            source_type: Some("windows".to_string()),
            extra,
        }
    }

    #[test]
    fn maps_logon_event_to_authentication() {
        let parsed = WindowsParser.parse(&raw(4624)).unwrap();
        assert_eq!(parsed["event"]["category"], "authentication");
    }

    #[test]
    fn maps_account_management_event_to_iam() {
        let parsed = WindowsParser.parse(&raw(4720)).unwrap();
        assert_eq!(parsed["event"]["category"], "iam");
    }

    #[test]
    fn maps_unrecognized_event_to_system() {
        let parsed = WindowsParser.parse(&raw(1000)).unwrap();
        assert_eq!(parsed["event"]["category"], "system");
    }

    #[test]
    fn returns_none_without_winlog_block() {
        let raw = RawEvent {
            message: "plain text".to_string(),
            source_ip: None,
            source_type: Some("windows".to_string()),
            extra: Default::default(),
        };
        assert!(WindowsParser.parse(&raw).is_none());
    }
}
