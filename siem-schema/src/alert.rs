use crate::event::Event;
use crate::rule::{Rule, Severity};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub category: Option<String>,
}

impl From<&Rule> for AlertRule {
    fn from(rule: &Rule) -> Self {
        AlertRule {
            id: rule.id.clone(),
            name: rule.name.clone(),
            description: rule.description.clone(),
            severity: rule.severity,
            category: rule.category.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    New,
}

/// The record pushed onto `alerts:queue` by the detection engine and
/// consumed by the alert manager (§3, §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "@timestamp")]
    pub timestamp: String,
    pub rule: AlertRule,
    pub event: Event,
    pub status: AlertStatus,
    pub generated_at: String,
}

impl Alert {
    pub fn new(rule: &Rule, event: Event) -> Self {
        let now = Utc::now().to_rfc3339();
        Alert {
            timestamp: now.clone(),
            rule: AlertRule::from(rule),
            event,
            status: AlertStatus::New,
            generated_at: now,
        }
    }

    /// Fields that feed the alert manager's dedup hash (§4.8): rule id plus
    /// source/destination IP, each defaulting to the empty string when the
    /// triggering event lacks that namespace.
    pub fn dedup_fields(&self) -> (String, String, String) {
        (
            self.rule.id.clone(),
            self.event.source_ip().unwrap_or("").to_string(),
            self.event.destination_ip().unwrap_or("").to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Correlation, Detection, RuleType};
    use serde_json::json;

    fn sample_rule() -> Rule {
        Rule {
            id: "ssh-bruteforce".to_string(),
            name: "SSH Brute Force".to_string(),
            description: "Repeated failed SSH logins".to_string(),
            severity: Severity::High,
            category: Some("authentication".to_string()),
            enabled: true,
            rule_type: RuleType::Threshold,
            detection: Detection::default(),
            correlation: Correlation::default(),
            tags: vec![],
            actions: vec![],
        }
    }

    #[test]
    fn carries_rule_identity_into_alert() {
        let rule = sample_rule();
        let event = Event::from_value(json!({"source": {"ip": "10.0.0.5"}}));
        let alert = Alert::new(&rule, event);
        assert_eq!(alert.rule.id, "ssh-bruteforce");
        assert_eq!(alert.rule.severity, Severity::High);
    }

    #[test]
    fn dedup_fields_default_missing_ips_to_empty() {
        let rule = sample_rule();
        let event = Event::from_value(json!({"source": {"ip": "10.0.0.5"}}));
        let alert = Alert::new(&rule, event);
        let (rule_id, src, dst) = alert.dedup_fields();
        assert_eq!(rule_id, "ssh-bruteforce");
        assert_eq!(src, "10.0.0.5");
        assert_eq!(dst, "");
    }
}
