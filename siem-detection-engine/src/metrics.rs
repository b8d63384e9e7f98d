//! Lightweight atomic counters (§9.1), grounded on `siem_consumer`'s
//! `AtomicU64` globals -- not a full Prometheus exporter (the read-side
//! HTTP surface is an external collaborator, §1), but real state the
//! workers update and tests can inspect.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct DetectionMetrics {
    pub events_processed: AtomicU64,
    pub events_enriched: AtomicU64,
    pub alerts_generated: AtomicU64,
    pub rules_matched: AtomicU64,
    pub parse_errors: AtomicU64,
}

impl DetectionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processed(&self) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_enriched(&self) {
        self.events_enriched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert(&self) {
        self.alerts_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rule_match(&self) {
        self.rules_matched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_processed: self.events_processed.load(Ordering::Relaxed),
            events_enriched: self.events_enriched.load(Ordering::Relaxed),
            alerts_generated: self.alerts_generated.load(Ordering::Relaxed),
            rules_matched: self.rules_matched.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub events_processed: u64,
    pub events_enriched: u64,
    pub alerts_generated: u64,
    pub rules_matched: u64,
    pub parse_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_accumulate() {
        let metrics = DetectionMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
        metrics.record_processed();
        metrics.record_processed();
        metrics.record_alert();
        let snap = metrics.snapshot();
        assert_eq!(snap.events_processed, 2);
        assert_eq!(snap.alerts_generated, 1);
    }
}
