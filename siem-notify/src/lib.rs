//! Notification channels and severity-based routing (§4.9, §6). Each
//! channel is a capability `Send(alert) -> Result<()>` with a boolean
//! `enabled`, composed with no inheritance (§9).

pub mod email;
pub mod pagerduty;
pub mod router;
pub mod slack;
pub mod webhook;

use async_trait::async_trait;
use siem_common::error::Result;
use siem_schema::Alert;

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;
    fn enabled(&self) -> bool;
    async fn send(&self, alert: &Alert) -> Result<()>;
}

pub use email::EmailNotifier;
pub use pagerduty::PagerDutyNotifier;
pub use router::{channels_for_severity, Channel};
pub use slack::SlackNotifier;
pub use webhook::WebhookNotifier;
