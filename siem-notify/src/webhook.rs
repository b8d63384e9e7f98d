//! Generic bearer-token webhook notifier. Not part of the default severity
//! routing table (§4.9), but kept constructible and independently testable
//! -- the original alert manager ships this as a fourth notifier alongside
//! Slack/PagerDuty/email (§9.1).

use crate::Notifier;
use async_trait::async_trait;
use siem_common::error::{Result, SiemError};
use siem_schema::Alert;

pub struct WebhookNotifier {
    url: Option<String>,
    bearer_token: Option<String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: Option<String>, bearer_token: Option<String>) -> Self {
        WebhookNotifier {
            url,
            bearer_token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn enabled(&self) -> bool {
        self.url.is_some()
    }

    async fn send(&self, alert: &Alert) -> Result<()> {
        let Some(url) = &self.url else {
            return Ok(());
        };
        let mut request = self.client.post(url).json(alert);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(SiemError::notification(format!(
                "webhook returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
