use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use siem_common::dotted::{get_path, set_path};
use std::ops::{Deref, DerefMut};

pub const ECS_VERSION: &str = "8.0.0";

/// The canonical ECS-shaped in-pipeline record (§3). Namespaces are loosely
/// typed -- each parser populates a different subset -- so `Event` wraps a
/// `serde_json::Value` object tree rather than a fixed struct, with typed
/// accessors layered on top for the fields the rest of the pipeline reads
/// by name (timestamp, ecs version, source/destination IP).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Event(pub Value);

impl Deref for Event {
    type Target = Value;
    fn deref(&self) -> &Value {
        &self.0
    }
}

impl DerefMut for Event {
    fn deref_mut(&mut self) -> &mut Value {
        &mut self.0
    }
}

impl Event {
    pub fn empty() -> Self {
        Event(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Event(value)
    }

    pub fn get_path(&self, path: &str) -> Option<&Value> {
        get_path(&self.0, path)
    }

    pub fn set_path(&mut self, path: &str, value: Value) {
        set_path(&mut self.0, path, value);
    }

    pub fn timestamp_raw(&self) -> Option<&str> {
        self.0.get("@timestamp").and_then(Value::as_str)
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp_raw()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn ecs_version(&self) -> Option<&str> {
        self.get_path("ecs.version").and_then(Value::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    pub fn source_ip(&self) -> Option<&str> {
        self.get_path("source.ip").and_then(Value::as_str)
    }

    pub fn destination_ip(&self) -> Option<&str> {
        self.get_path("destination.ip").and_then(Value::as_str)
    }

    /// §8 invariant: `@timestamp` present and RFC3339-parseable, `ecs.version`
    /// set to the pipeline's ECS version.
    pub fn is_well_formed(&self) -> bool {
        self.timestamp().is_some() && self.ecs_version() == Some(ECS_VERSION)
    }

    /// §3 invariants: IP literals parse, status codes and byte counts are in
    /// range. Violations are reported rather than silently dropped so callers
    /// can log-and-skip per §7 without guessing what went wrong.
    pub fn validate_invariants(&self) -> Result<(), String> {
        for path in ["source.ip", "destination.ip"] {
            if let Some(ip) = self.get_path(path).and_then(Value::as_str) {
                if ip.parse::<std::net::IpAddr>().is_err() {
                    return Err(format!("{path} is not a valid IP literal: {ip}"));
                }
            }
        }
        if let Some(status) = self
            .get_path("http.response.status_code")
            .and_then(Value::as_i64)
        {
            if !(100..=599).contains(&status) {
                return Err(format!("http.response.status_code out of range: {status}"));
            }
        }
        if let Some(bytes) = self.get_path("network.bytes").and_then(Value::as_i64) {
            if bytes < 0 {
                return Err(format!("network.bytes is negative: {bytes}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn well_formed_requires_timestamp_and_ecs_version() {
        let e = Event::from_value(json!({
            "@timestamp": "2024-01-15T10:30:00Z",
            "ecs": {"version": "8.0.0"},
        }));
        assert!(e.is_well_formed());

        let missing_version = Event::from_value(json!({"@timestamp": "2024-01-15T10:30:00Z"}));
        assert!(!missing_version.is_well_formed());

        let bad_timestamp = Event::from_value(json!({
            "@timestamp": "not-a-time",
            "ecs": {"version": "8.0.0"},
        }));
        assert!(!bad_timestamp.is_well_formed());
    }

    #[test]
    fn rejects_invalid_ip_literal() {
        let e = Event::from_value(json!({"source": {"ip": "not-an-ip"}}));
        assert!(e.validate_invariants().is_err());
    }

    #[test]
    fn rejects_out_of_range_status() {
        let e = Event::from_value(json!({"http": {"response": {"status_code": 999}}}));
        assert!(e.validate_invariants().is_err());
    }

    #[test]
    fn rejects_negative_bytes() {
        let e = Event::from_value(json!({"network": {"bytes": -1}}));
        assert!(e.validate_invariants().is_err());
    }

    #[test]
    fn accepts_well_formed_event() {
        let e = Event::from_value(json!({
            "source": {"ip": "10.0.0.1"},
            "http": {"response": {"status_code": 200}},
            "network": {"bytes": 512},
        }));
        assert!(e.validate_invariants().is_ok());
    }
}
