use crate::firewall::FirewallParser;
use crate::json::JsonParser;
use crate::syslog::SyslogParser;
use crate::web_access::WebAccessParser;
use crate::windows::WindowsParser;
use crate::Parser;
use serde_json::Value;
use siem_schema::RawEvent;
use std::collections::HashMap;
use tracing::warn;

/// Dispatches a raw event to the parser named by its `source_type`,
/// stamping `@metadata.{parser, source_type}` on success (§4.2). Unknown
/// `source_type`s fall back to `json` rather than being dropped.
pub struct ParserEngine {
    parsers: HashMap<&'static str, Box<dyn Parser + Send + Sync>>,
}

impl ParserEngine {
    pub fn new() -> Self {
        let mut parsers: HashMap<&'static str, Box<dyn Parser + Send + Sync>> = HashMap::new();
        parsers.insert("syslog", Box::new(SyslogParser));
        parsers.insert("windows", Box::new(WindowsParser));
        parsers.insert("apache", Box::new(WebAccessParser));
        parsers.insert("web_access", Box::new(WebAccessParser));
        parsers.insert("firewall", Box::new(FirewallParser));
        parsers.insert("json", Box::new(JsonParser));
        ParserEngine { parsers }
    }

    pub fn parse(&self, raw: &RawEvent) -> Option<Value> {
        let key = raw.parser_key();
        let parser = self.parsers.get(key).unwrap_or_else(|| {
            warn!(source_type = key, "unknown source_type, falling back to json parser");
            self.parsers.get("json").expect("json parser always registered")
        });

        let mut parsed = parser.parse(raw)?;
        let parser_name = parser_name(key);
        if let Some(obj) = parsed.as_object_mut() {
            obj.insert(
                "@metadata".to_string(),
                serde_json::json!({ "parser": parser_name, "source_type": key }),
            );
        }
        Some(parsed)
    }
}

impl Default for ParserEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn parser_name(key: &str) -> &'static str {
    match key {
        "syslog" => "SyslogParser",
        "windows" => "WindowsParser",
        "apache" | "web_access" => "WebAccessParser",
        "firewall" => "FirewallParser",
        _ => "JsonParser",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(source_type: &str, message: &str) -> RawEvent {
        RawEvent {
            message: message.to_string(),
            source_ip: None,
            source_type: Some(source_type.to_string()),
            extra: Default::default(),
        }
    }

    #[test]
    fn stamps_metadata_on_success() {
        let engine = ParserEngine::new();
        let event = engine
            .parse(&raw("syslog", "Jan 15 10:30:00 host sshd[1]: hi"))
            .unwrap();
        assert_eq!(event["@metadata"]["parser"], "SyslogParser");
        assert_eq!(event["@metadata"]["source_type"], "syslog");
    }

    #[test]
    fn falls_back_to_json_parser_for_unknown_source_type() {
        let engine = ParserEngine::new();
        let event = engine.parse(&raw("carbon-pigeon", "hello")).unwrap();
        assert_eq!(event["@metadata"]["parser"], "JsonParser");
    }

    #[test]
    fn defaults_to_json_when_source_type_absent() {
        let engine = ParserEngine::new();
        let raw = RawEvent {
            message: "plain".to_string(),
            source_ip: None,
            source_type: None,
            extra: Default::default(),
        };
        let event = engine.parse(&raw).unwrap();
        assert_eq!(event["@metadata"]["source_type"], "json");
    }
}
