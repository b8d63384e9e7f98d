//! Alert manager binary: consumes `alerts:queue`, deduplicates, throttles
//! per rule, and fans out to severity-routed notification channels (§4.9).

mod config;
mod dedup;
mod throttle;
mod worker;

use anyhow::{Context, Result};
use clap::Parser;
use config::Settings;
use dedup::DedupTracker;
use siem_notify::email::SmtpConfig;
use siem_notify::{EmailNotifier, Notifier, PagerDutyNotifier, SlackNotifier, WebhookNotifier};
use siem_queue::QueueClient;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use throttle::ThrottleTracker;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worker::AlertWorker;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siem_alert_manager=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::parse();
    info!(workers = settings.alert_workers, "starting SIEM alert manager");

    // §7 kind 6: cannot reach the queue at all at boot is fatal.
    let queue = QueueClient::connect(&settings.redis_url())
        .await
        .context("failed to connect to queue")?;
    info!("connected to queue");

    let dedup = Arc::new(DedupTracker::new(chrono::Duration::seconds(
        settings.dedup_window_secs,
    )));
    let throttle = Arc::new(ThrottleTracker::new(
        chrono::Duration::seconds(settings.throttle_window_secs),
        settings.throttle_limit,
    ));

    let pagerduty: Option<Arc<dyn Notifier>> = Some(Arc::new(PagerDutyNotifier::new(
        settings.pagerduty_routing_key.clone(),
        settings.pagerduty_threshold(),
    )));
    let slack: Option<Arc<dyn Notifier>> = Some(Arc::new(SlackNotifier::new(
        settings.slack_webhook_url.clone(),
    )));
    let smtp_config = match (&settings.smtp_host, &settings.smtp_from) {
        (Some(host), Some(from)) => Some(SmtpConfig {
            host: host.clone(),
            port: settings.smtp_port,
            username: settings.smtp_username.clone().unwrap_or_default(),
            password: settings.smtp_password.clone().unwrap_or_default(),
            from: from.clone(),
            to: settings.smtp_to.clone(),
        }),
        _ => None,
    };
    let email: Option<Arc<dyn Notifier>> = Some(Arc::new(EmailNotifier::new(smtp_config)));
    let webhook: Option<Arc<dyn Notifier>> = Some(Arc::new(WebhookNotifier::new(
        settings.webhook_url.clone(),
        settings.webhook_bearer_token.clone(),
    )));

    let running = Arc::new(AtomicBool::new(true));
    let mut handles = Vec::new();

    for id in 0..settings.alert_workers {
        let worker = AlertWorker {
            id,
            queue: queue.clone(),
            dedup: dedup.clone(),
            throttle: throttle.clone(),
            pagerduty: pagerduty.clone(),
            slack: slack.clone(),
            email: email.clone(),
            webhook: webhook.clone(),
            poll_interval: Duration::from_millis(500),
        };
        let running = running.clone();
        handles.push(tokio::spawn(worker.run(running)));
    }

    let sweep_dedup = dedup.clone();
    let sweep_running = running.clone();
    handles.push(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        while sweep_running.load(Ordering::SeqCst) {
            ticker.tick().await;
            sweep_dedup.sweep(chrono::Utc::now());
        }
    }));

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("received shutdown signal, finishing in-flight alerts");
    running.store(false, Ordering::SeqCst);

    let shutdown = async {
        for handle in handles {
            let _ = handle.await;
        }
    };
    if tokio::time::timeout(Duration::from_secs(5), shutdown).await.is_err() {
        warn!("workers did not finish within 5s, abandoning in-flight work");
    }

    info!("shutdown complete");
    Ok(())
}
