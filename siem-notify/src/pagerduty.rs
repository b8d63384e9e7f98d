//! PagerDuty Events API v2 notifier (§6). Only fires when the alert's
//! severity is at or above `PAGERDUTY_SEVERITY_THRESHOLD`.

use crate::Notifier;
use async_trait::async_trait;
use serde_json::json;
use siem_common::error::{Result, SiemError};
use siem_schema::{Alert, Severity};

pub struct PagerDutyNotifier {
    routing_key: Option<String>,
    threshold: Severity,
    client: reqwest::Client,
}

impl PagerDutyNotifier {
    pub fn new(routing_key: Option<String>, threshold: Severity) -> Self {
        PagerDutyNotifier {
            routing_key,
            threshold,
            client: reqwest::Client::new(),
        }
    }

    fn payload(routing_key: &str, alert: &Alert) -> serde_json::Value {
        json!({
            "routing_key": routing_key,
            "event_action": "trigger",
            "payload": {
                "summary": format!("{}: {}", alert.rule.name, alert.rule.description),
                "severity": alert.rule.severity.as_str().to_lowercase(),
                "source": "SIEM",
                "custom_details": alert.event,
            }
        })
    }
}

#[async_trait]
impl Notifier for PagerDutyNotifier {
    fn name(&self) -> &'static str {
        "pagerduty"
    }

    fn enabled(&self) -> bool {
        self.routing_key.is_some()
    }

    async fn send(&self, alert: &Alert) -> Result<()> {
        let Some(routing_key) = &self.routing_key else {
            return Ok(());
        };
        if alert.rule.severity < self.threshold {
            return Ok(());
        }
        let resp = self
            .client
            .post("https://events.pagerduty.com/v2/enqueue")
            .json(&Self::payload(routing_key, alert))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SiemError::notification(format!(
                "pagerduty enqueue returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
