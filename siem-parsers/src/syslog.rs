use crate::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use siem_schema::RawEvent;

static SYSLOG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<ts>\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(?P<host>\S+)\s+(?P<proc>\S+?)(\[(?P<pid>\d+)\])?:\s+(?P<msg>.*)$",
    )
    .expect("static syslog regex is valid")
});

/// Classic BSD syslog (RFC 3164) line parser (§4.2).
pub struct SyslogParser;

fn infer_log_level(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    if lower.contains("error") || lower.contains("failed") {
        "error"
    } else if lower.contains("warning") || lower.contains("warn") {
        "warning"
    } else if lower.contains("info") {
        "info"
    } else {
        "notice"
    }
}

impl Parser for SyslogParser {
    fn parse(&self, raw: &RawEvent) -> Option<Value> {
        let caps = SYSLOG_RE.captures(&raw.message)?;
        let msg = caps.name("msg").map(|m| m.as_str()).unwrap_or("");
        let mut event = json!({
            "message": raw.message,
            "host": { "hostname": caps.name("host").map(|m| m.as_str()) },
            "process": { "name": caps.name("proc").map(|m| m.as_str()) },
            "log": { "level": infer_log_level(msg) },
            "event": { "category": "system", "type": "info" },
        });
        if let Some(pid) = caps.name("pid").and_then(|m| m.as_str().parse::<i64>().ok()) {
            event["process"]["pid"] = json!(pid);
        }
        Some(event)
    }
}
