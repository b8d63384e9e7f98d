//! Slack webhook notifier (§6): a standard attachment, colored and titled
//! by severity.

use crate::Notifier;
use async_trait::async_trait;
use serde_json::json;
use siem_common::error::{Result, SiemError};
use siem_schema::{Alert, Severity};

pub struct SlackNotifier {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        SlackNotifier {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    fn color(severity: Severity) -> &'static str {
        match severity {
            Severity::Critical => "danger",
            Severity::High => "warning",
            Severity::Medium => "#FFA500",
            Severity::Low => "good",
        }
    }

    fn payload(alert: &Alert) -> serde_json::Value {
        json!({
            "attachments": [{
                "color": Self::color(alert.rule.severity),
                "title": format!("[{}] {}", alert.rule.severity.as_str(), alert.rule.name),
                "text": alert.rule.description,
                "fields": [
                    { "title": "Source IP", "value": alert.event.source_ip().unwrap_or("unknown"), "short": true },
                    { "title": "Severity", "value": alert.rule.severity.as_str(), "short": true },
                ],
                "footer": "SIEM Alert",
            }]
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, alert: &Alert) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            return Ok(());
        };
        let resp = self
            .client
            .post(url)
            .json(&Self::payload(alert))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SiemError::notification(format!(
                "slack webhook returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
