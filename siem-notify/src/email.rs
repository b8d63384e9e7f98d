//! Email notifier (§6): a multipart message with an HTML body containing
//! the rule name, severity, description, and pretty-printed triggering
//! event.

use crate::Notifier;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use siem_common::error::{Result, SiemError};
use siem_schema::Alert;

pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
}

pub struct EmailNotifier {
    config: Option<SmtpConfig>,
}

impl EmailNotifier {
    pub fn new(config: Option<SmtpConfig>) -> Self {
        EmailNotifier { config }
    }

    fn html_body(alert: &Alert) -> String {
        let pretty_event = serde_json::to_string_pretty(&alert.event.0)
            .unwrap_or_else(|_| "<unable to render event>".to_string());
        format!(
            "<h2>{}</h2><p><b>Severity:</b> {}</p><p>{}</p><pre>{}</pre>",
            alert.rule.name,
            alert.rule.severity.as_str(),
            alert.rule.description,
            html_escape(&pretty_event),
        )
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn send(&self, alert: &Alert) -> Result<()> {
        let Some(config) = &self.config else {
            return Ok(());
        };
        let subject = format!("[{}] {}", alert.rule.severity.as_str(), alert.rule.name);
        let body = Self::html_body(alert);

        let mut builder = Message::builder()
            .from(
                config
                    .from
                    .parse()
                    .map_err(|e| SiemError::notification(format!("invalid from address: {e}")))?,
            )
            .subject(subject);
        for to in &config.to {
            builder = builder.to(to
                .parse()
                .map_err(|e| SiemError::notification(format!("invalid to address: {e}")))?);
        }
        let email = builder
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| SiemError::notification(format!("failed to build message: {e}")))?;

        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| SiemError::notification(format!("smtp relay setup failed: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();

        mailer
            .send(email)
            .await
            .map_err(|e| SiemError::notification(format!("smtp send failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siem_schema::{Correlation, Detection, Event, Rule, RuleType, Severity};
    use std::collections::HashMap;

    fn sample_alert() -> Alert {
        let rule = Rule {
            id: "web-001".to_string(),
            name: "SQL Injection".to_string(),
            description: "SQLi pattern in query string".to_string(),
            severity: Severity::High,
            category: None,
            enabled: true,
            rule_type: RuleType::Simple,
            detection: Detection {
                selection: HashMap::new(),
                ..Default::default()
            },
            correlation: Correlation::default(),
            tags: vec![],
            actions: vec![],
        };
        let event = Event::from_value(serde_json::json!({"source": {"ip": "10.0.0.1"}}));
        Alert::new(&rule, event)
    }

    #[test]
    fn html_body_contains_rule_name_and_pretty_event() {
        let alert = sample_alert();
        let body = EmailNotifier::html_body(&alert);
        assert!(body.contains("SQL Injection"));
        assert!(body.contains("HIGH"));
        assert!(body.contains("10.0.0.1"));
    }

    #[tokio::test]
    async fn disabled_without_config() {
        let notifier = EmailNotifier::new(None);
        assert!(!notifier.enabled());
        assert!(notifier.send(&sample_alert()).await.is_ok());
    }
}
