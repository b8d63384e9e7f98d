//! Detection engine binary: queue consumer, parser dispatch, schema
//! mapping, enrichment chain, rule evaluation (simple/threshold/
//! correlation), and bulk indexing (§2).

mod config;
mod indexer;
mod metrics;
mod worker;

use anyhow::{Context, Result};
use clap::Parser;
use config::Settings;
use indexer::BulkIndexer;
use metrics::DetectionMetrics;
use siem_enrich::dns::ReverseDnsEnricher;
use siem_enrich::geoip::GeoIpEnricher;
use siem_enrich::threat_intel::ThreatIntelEnricher;
use siem_enrich::EnrichmentChain;
use siem_parsers::ParserEngine;
use siem_queue::QueueClient;
use siem_rules::correlation::CorrelationEngine;
use siem_rules::threshold::ThresholdTracker;
use siem_rules::{RuleEvaluator, RuleStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worker::DetectionWorker;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siem_detection_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::parse();
    info!(
        workers = settings.detection_workers,
        rules_dir = %settings.rules_dir,
        "starting SIEM detection engine"
    );

    // §7 kind 6: cannot reach the queue at all at boot is fatal.
    let queue = QueueClient::connect(&settings.redis_url())
        .await
        .context("failed to connect to queue")?;
    info!("connected to queue");

    let rule_store = Arc::new(RuleStore::load(&settings.rules_dir));
    let parsers = Arc::new(ParserEngine::new());

    let geoip = GeoIpEnricher::open(settings.geoip_db_path.as_deref());
    let reverse_dns = ReverseDnsEnricher::new(ReverseDnsEnricher::MIN_CAPACITY, Duration::from_secs(3600));
    let threat_intel = match &settings.threat_intel_feed_path {
        Some(path) => ThreatIntelEnricher::load_from_file(path).unwrap_or_else(|e| {
            warn!(error = %e, path, "failed to load threat intel feed, enricher is a no-op");
            ThreatIntelEnricher::empty()
        }),
        None => ThreatIntelEnricher::empty(),
    };
    let enrichment = Arc::new(EnrichmentChain::new(vec![
        Box::new(geoip),
        Box::new(reverse_dns),
        Box::new(threat_intel),
    ]));

    let thresholds = Arc::new(ThresholdTracker::new());
    let correlations = Arc::new(CorrelationEngine::new());
    let evaluator = Arc::new(RuleEvaluator::new(thresholds.clone(), correlations.clone()));

    let opensearch_base = settings
        .opensearch_base_url()
        .unwrap_or_else(|_| "http://localhost:9200".to_string());
    let auth = match (&settings.opensearch_user, &settings.opensearch_password) {
        (Some(u), Some(p)) => Some((u.clone(), p.clone())),
        _ => None,
    };
    let indexer = Arc::new(BulkIndexer::new(opensearch_base, settings.index_events_prefix.clone(), auth));

    let metrics = Arc::new(DetectionMetrics::new());
    let running = Arc::new(AtomicBool::new(true));

    let mut handles = Vec::new();

    for id in 0..settings.detection_workers {
        let worker = DetectionWorker {
            id,
            queue: queue.clone(),
            parsers: parsers.clone(),
            enrichment: enrichment.clone(),
            evaluator: evaluator.clone(),
            rule_store: rule_store.clone(),
            indexer: indexer.clone(),
            metrics: metrics.clone(),
            batch_size: settings.detection_batch_size,
            poll_interval: Duration::from_secs(settings.detection_poll_interval_secs),
        };
        let running = running.clone();
        handles.push(tokio::spawn(worker.run(running)));
    }

    let reload_store = rule_store.clone();
    let reload_running = running.clone();
    let reload_interval = Duration::from_secs(settings.rule_reload_interval_secs);
    handles.push(tokio::spawn(async move {
        reload_store.run_reload_loop(reload_interval, reload_running).await;
    }));

    let janitor_running = running.clone();
    handles.push(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        while janitor_running.load(Ordering::SeqCst) {
            ticker.tick().await;
            let now = chrono::Utc::now();
            thresholds.sweep(now, chrono::Duration::seconds(120));
            correlations.sweep(now, chrono::Duration::seconds(120));
        }
    }));

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("received shutdown signal, finishing in-flight events");
    running.store(false, Ordering::SeqCst);

    let shutdown = async {
        for handle in handles {
            let _ = handle.await;
        }
    };
    if tokio::time::timeout(Duration::from_secs(5), shutdown).await.is_err() {
        warn!("workers did not finish within 5s, abandoning in-flight work");
    }

    let snapshot = metrics.snapshot();
    info!(
        processed = snapshot.events_processed,
        alerts = snapshot.alerts_generated,
        parse_errors = snapshot.parse_errors,
        "shutdown complete"
    );
    Ok(())
}
