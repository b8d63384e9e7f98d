use crate::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use siem_schema::RawEvent;

static SRC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"SRC=(\S+)").unwrap());
static DST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"DST=(\S+)").unwrap());
static SPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"SPT=(\d+)").unwrap());
static DPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"DPT=(\d+)").unwrap());
static PROTO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"PROTO=(\S+)").unwrap());

/// iptables-style key=value firewall log line parser (§4.2).
pub struct FirewallParser;

impl Parser for FirewallParser {
    fn parse(&self, raw: &RawEvent) -> Option<Value> {
        let src = SRC_RE.captures(&raw.message).map(|c| c[1].to_string());
        let dst = DST_RE.captures(&raw.message).map(|c| c[1].to_string());
        if src.is_none() && dst.is_none() {
            return None;
        }
        let spt = SPT_RE
            .captures(&raw.message)
            .and_then(|c| c[1].parse::<i64>().ok());
        let dpt = DPT_RE
            .captures(&raw.message)
            .and_then(|c| c[1].parse::<i64>().ok());
        let proto = PROTO_RE.captures(&raw.message).map(|c| c[1].to_string());

        let event_type = if raw.message.contains("DENY") || raw.message.contains("DROP") {
            "denied"
        } else {
            "allowed"
        };

        Some(json!({
            "message": raw.message,
            "source": { "ip": src, "port": spt },
            "destination": { "ip": dst, "port": dpt },
            "network": { "protocol": proto },
            "event": { "category": "network", "type": event_type },
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
            source_type: Some("firewall".to_string()),
            extra: Default::default(),
        }
    }

    #[test]
    fn marks_deny_as_denied() {
        let line = "DENY IN=eth0 OUT= SRC=198.51.100.4 DST=10.0.0.1 PROTO=TCP SPT=44321 DPT=22";
        let parsed = FirewallParser.parse(&raw(line)).unwrap();
        assert_eq!(parsed["source"]["ip"], "198.51.100.4");
        assert_eq!(parsed["destination"]["port"], 22);
        assert_eq!(parsed["event"]["type"], "denied");
    }

    #[test]
    fn marks_absence_of_deny_drop_as_allowed() {
        let line = "ACCEPT IN=eth0 SRC=198.51.100.4 DST=10.0.0.1 PROTO=TCP SPT=44321 DPT=443";
        let parsed = FirewallParser.parse(&raw(line)).unwrap();
        assert_eq!(parsed["event"]["type"], "allowed");
    }

    #[test]
    fn returns_none_when_no_addresses_present() {
        assert!(FirewallParser.parse(&raw("no kv pairs here")).is_none());
    }
}
