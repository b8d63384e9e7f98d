//! An alert consumer worker (§4.9): pops alerts off `alerts:queue`,
//! deduplicates, throttles, then fans out to the channels the alert's
//! severity routes to. Each channel's delivery is isolated -- one channel
//! failing doesn't stop the others, and there is no automatic retry (§4.9
//! step 4, §7 kind 5).

use crate::dedup::DedupTracker;
use crate::throttle::ThrottleTracker;
use siem_notify::{channels_for_severity, Channel, Notifier};
use siem_queue::QueueClient;
use siem_schema::Alert;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const ALERTS_LIST: &str = "alerts:queue";

pub struct AlertWorker {
    pub id: usize,
    pub queue: QueueClient,
    pub dedup: Arc<DedupTracker>,
    pub throttle: Arc<ThrottleTracker>,
    pub pagerduty: Option<Arc<dyn Notifier>>,
    pub slack: Option<Arc<dyn Notifier>>,
    pub email: Option<Arc<dyn Notifier>>,
    /// Held for parity with the original's notifier map, which always
    /// constructs a webhook notifier; the severity routing table (§4.9)
    /// never dispatches to it, same as the original.
    #[allow(dead_code)]
    pub webhook: Option<Arc<dyn Notifier>>,
    pub poll_interval: Duration,
}

impl AlertWorker {
    pub async fn run(self, running: Arc<AtomicBool>) {
        while running.load(Ordering::SeqCst) {
            match self.queue.pop_right(ALERTS_LIST).await {
                Ok(Some(payload)) => self.process_one(&payload).await,
                Ok(None) => tokio::time::sleep(self.poll_interval).await,
                Err(e) => {
                    warn!(worker = self.id, error = %e, "queue pop failed");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
        debug!(worker = self.id, "alert worker shut down");
    }

    async fn process_one(&self, payload: &str) {
        let alert: Alert = match serde_json::from_str(payload) {
            Ok(a) => a,
            Err(e) => {
                warn!(worker = self.id, error = %e, "alert payload is not valid JSON, dropping");
                return;
            }
        };

        let (rule_id, src_ip, dst_ip) = alert.dedup_fields();
        let key = DedupTracker::dedup_key(&rule_id, &src_ip, &dst_ip);
        let now = chrono::Utc::now();

        if !self.dedup.should_deliver(&key, now) {
            debug!(worker = self.id, rule_id, "alert suppressed by dedup");
            return;
        }

        if !self.throttle.allow(&rule_id, now) {
            warn!(worker = self.id, rule_id, "alert suppressed by per-rule throttle");
            return;
        }

        let channels = channels_for_severity(alert.rule.severity);
        let dispatches = channels.into_iter().filter_map(|channel| {
            let notifier: &Option<Arc<dyn Notifier>> = match channel {
                Channel::PagerDuty => &self.pagerduty,
                Channel::Slack => &self.slack,
                Channel::Email => &self.email,
            };
            let notifier = notifier.as_ref()?;
            if !notifier.enabled() {
                return None;
            }
            let notifier = notifier.clone();
            let alert = alert.clone();
            Some(async move { (notifier.name(), notifier.send(&alert).await) })
        });

        // §4.9 step 4: dispatch to every enabled channel in parallel; one
        // channel's failure is isolated from the others and never retried.
        let results = futures::future::join_all(dispatches).await;
        for (channel, result) in results {
            match result {
                Ok(()) => info!(worker = self.id, rule_id, channel, "alert delivered"),
                Err(e) => warn!(
                    worker = self.id,
                    rule_id,
                    channel,
                    error = %e,
                    "alert delivery failed, not retrying"
                ),
            }
        }
    }
}
