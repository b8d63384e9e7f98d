//! A detection worker (§2, §5): pops raw events off `events:raw`, dispatches
//! them through the parser, schema mapper, and enrichment chain, evaluates
//! the current rule snapshot, emits alerts to `alerts:queue`, and batches
//! enriched events into the bulk indexer. Runs until `running` goes false,
//! finishing the current event before returning (§5 cancellation model).

use crate::indexer::{BulkIndexer, DEFAULT_BATCH_TIMEOUT};
use crate::metrics::DetectionMetrics;
use siem_enrich::EnrichmentChain;
use siem_parsers::ParserEngine;
use siem_queue::QueueClient;
use siem_rules::RuleEvaluator;
use siem_schema::{Alert, Event, RawEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const RAW_EVENTS_LIST: &str = "events:raw";
pub const ALERTS_LIST: &str = "alerts:queue";

pub struct DetectionWorker {
    pub id: usize,
    pub queue: QueueClient,
    pub parsers: Arc<ParserEngine>,
    pub enrichment: Arc<EnrichmentChain>,
    pub evaluator: Arc<RuleEvaluator>,
    pub rule_store: Arc<siem_rules::RuleStore>,
    pub indexer: Arc<BulkIndexer>,
    pub metrics: Arc<DetectionMetrics>,
    pub batch_size: usize,
    pub poll_interval: Duration,
}

impl DetectionWorker {
    /// The worker's main loop. One non-blocking pop at a time so the
    /// running-flag check stays responsive; an idle queue sleeps
    /// `poll_interval` rather than spinning (§4.1, §6 `DETECTION_POLL_INTERVAL`).
    pub async fn run(self, running: Arc<AtomicBool>) {
        let mut pending_batch: Vec<Event> = Vec::with_capacity(self.batch_size);
        let mut batch_opened_at = Instant::now();

        while running.load(Ordering::SeqCst) {
            match self.queue.pop_right(RAW_EVENTS_LIST).await {
                Ok(Some(raw_json)) => {
                    if let Some(event) = self.process_one(&raw_json).await {
                        if pending_batch.is_empty() {
                            batch_opened_at = Instant::now();
                        }
                        pending_batch.push(event);
                    }
                }
                Ok(None) => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => {
                    warn!(worker = self.id, error = %e, "queue pop failed");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }

            let batch_due = pending_batch.len() >= self.batch_size
                || (!pending_batch.is_empty() && batch_opened_at.elapsed() >= DEFAULT_BATCH_TIMEOUT);
            if batch_due {
                let batch = std::mem::replace(&mut pending_batch, Vec::with_capacity(self.batch_size));
                self.indexer.index_batch(batch).await;
            }
        }

        if !pending_batch.is_empty() {
            self.indexer.index_batch(pending_batch).await;
        }
        debug!(worker = self.id, "detection worker shut down");
    }

    /// Parses, maps, enriches, and evaluates a single raw event. Returns
    /// the enriched `Event` for the caller to batch into the indexer, or
    /// `None` on a parse failure (counted, not propagated, §7 kind 2).
    async fn process_one(&self, raw_json: &str) -> Option<Event> {
        self.metrics.record_processed();

        let raw: RawEvent = match serde_json::from_str(raw_json) {
            Ok(r) => r,
            Err(e) => {
                warn!(worker = self.id, error = %e, "raw event is not valid JSON, dropping");
                self.metrics.record_parse_error();
                return None;
            }
        };

        let Some(parsed) = self.parsers.parse(&raw) else {
            warn!(worker = self.id, source_type = raw.parser_key(), "parser returned no result, dropping");
            self.metrics.record_parse_error();
            return None;
        };

        let mut event = siem_schema::mapper::map(parsed);
        if let Err(e) = event.validate_invariants() {
            warn!(worker = self.id, error = %e, "event failed invariant check, continuing anyway");
        }

        self.enrichment.run(&mut event).await;
        self.metrics.record_enriched();

        let snapshot = self.rule_store.current();
        let matches = self.evaluator.evaluate(&snapshot, &event);
        for m in matches {
            self.metrics.record_rule_match();
            let alert = Alert::new(&m.rule, event.clone());
            self.emit_alert(&alert).await;
        }

        Some(event)
    }

    async fn emit_alert(&self, alert: &Alert) {
        let Ok(payload) = serde_json::to_string(alert) else {
            warn!(worker = self.id, rule_id = %alert.rule.id, "failed to serialize alert, dropping");
            return;
        };
        match self.queue.push(ALERTS_LIST, &payload).await {
            Ok(()) => self.metrics.record_alert(),
            Err(e) => warn!(worker = self.id, error = %e, "failed to push alert to queue"),
        }
    }
}
