use crate::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use siem_schema::RawEvent;

static COMBINED_LOG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?P<client>\S+) \S+ (?P<userid>\S+) \[(?P<datetime>[^\]]+)\] "(?P<method>\S+) (?P<path>\S+) (?P<protocol>[^"]+)" (?P<status>\d+) (?P<size>\S+) "(?P<referrer>[^"]*)" "(?P<agent>[^"]*)"$"#,
    )
    .expect("static combined log format regex is valid")
});

/// Apache/Nginx "combined" access log parser (§4.2).
pub struct WebAccessParser;

fn split_path_query(path: &str) -> (&str, Option<&str>) {
    match path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path, None),
    }
}

impl Parser for WebAccessParser {
    fn parse(&self, raw: &RawEvent) -> Option<Value> {
        let caps = COMBINED_LOG_RE.captures(&raw.message)?;
        let status: i64 = caps.name("status")?.as_str().parse().ok()?;
        let size_raw = caps.name("size").map(|m| m.as_str()).unwrap_or("-");
        let size: i64 = if size_raw == "-" {
            0
        } else {
            size_raw.parse().ok()?
        };
        let full_path = caps.name("path").map(|m| m.as_str()).unwrap_or("");
        let (path, query) = split_path_query(full_path);

        Some(json!({
            "message": raw.message,
            "source": { "ip": caps.name("client").map(|m| m.as_str()) },
            "user": { "name": caps.name("userid").map(|m| m.as_str()) },
            "http": {
                "request": {
                    "method": caps.name("method").map(|m| m.as_str()),
                    "referrer": caps.name("referrer").map(|m| m.as_str()),
                },
                "response": {
                    "status_code": status,
                    "body": { "bytes": size },
                },
                "version": caps.name("protocol").map(|m| m.as_str()),
            },
            "url": {
                "path": path,
                "query": query,
                "full": full_path,
            },
            "user_agent": { "original": caps.name("agent").map(|m| m.as_str()) },
            "event": { "category": "web", "type": "access" },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(message: &str) -> RawEvent {
        RawEvent {
            message: message.to_string(),
            source_ip: None,
            source_type: Some("web_access".to_string()),
            extra: Default::default(),
        }
    }

    #[test]
    fn parses_combined_log_format() {
        let line = r#"203.0.113.9 - alice [15/Jan/2024:10:30:00 +0000] "GET /login?user=alice HTTP/1.1" 200 532 "https://example.com/" "Mozilla/5.0""#;
        let parsed = WebAccessParser.parse(&raw(line)).unwrap();
        assert_eq!(parsed["source"]["ip"], "203.0.113.9");
        assert_eq!(parsed["http"]["request"]["method"], "GET");
        assert_eq!(parsed["http"]["response"]["status_code"], 200);
        assert_eq!(parsed["http"]["response"]["body"]["bytes"], 532);
        assert_eq!(parsed["url"]["path"], "/login");
        assert_eq!(parsed["url"]["query"], "user=alice");
    }

    #[test]
    fn maps_dash_size_to_zero() {
        let line = r#"203.0.113.9 - - [15/Jan/2024:10:30:00 +0000] "GET / HTTP/1.1" 304 - "-" "curl/8.0""#;
        let parsed = WebAccessParser.parse(&raw(line)).unwrap();
        assert_eq!(parsed["http"]["response"]["body"]["bytes"], 0);
    }

    #[test]
    fn returns_none_on_malformed_line() {
        assert!(WebAccessParser.parse(&raw("garbage")).is_none());
    }
}
