//! Correlation engine (§4.7): per-`(rule.id, group_key)` window of
//! `(timestamp, event)` pairs, fires once the retained count reaches
//! `min_events`. Shares the threshold tracker's ring-buffer and janitor
//! semantics since both are windowed per-group-key state.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use siem_schema::Event;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::threshold::MAX_BUCKET_ENTRIES;

struct Entry {
    at: DateTime<Utc>,
    event: Event,
}

struct Bucket {
    entries: VecDeque<Entry>,
    last_active: DateTime<Utc>,
}

impl Bucket {
    fn new(now: DateTime<Utc>) -> Self {
        Bucket {
            entries: VecDeque::new(),
            last_active: now,
        }
    }

    fn push(&mut self, now: DateTime<Utc>, event: Event) {
        self.entries.push_back(Entry { at: now, event });
        if self.entries.len() > MAX_BUCKET_ENTRIES {
            self.entries.pop_front();
        }
        self.last_active = now;
    }

    fn prune(&mut self, cutoff: DateTime<Utc>) {
        while let Some(front) = self.entries.front() {
            if front.at < cutoff {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }
}

pub struct CorrelationEngine {
    buckets: DashMap<(String, String), Mutex<Bucket>>,
}

impl CorrelationEngine {
    pub fn new() -> Self {
        CorrelationEngine {
            buckets: DashMap::new(),
        }
    }

    /// Appends `(now, event)`, prunes entries outside `timeframe`, and
    /// returns true iff the retained count is >= `min_events` (§4.7).
    pub fn submit(
        &self,
        rule_id: &str,
        group_key: &str,
        now: DateTime<Utc>,
        timeframe: chrono::Duration,
        min_events: u64,
        event: Event,
    ) -> bool {
        let key = (rule_id.to_string(), group_key.to_string());
        let bucket_lock = self
            .buckets
            .entry(key)
            .or_insert_with(|| Mutex::new(Bucket::new(now)));
        let mut bucket = bucket_lock.lock();
        bucket.push(now, event);
        bucket.prune(now - timeframe);
        bucket.entries.len() as u64 >= min_events
    }

    /// Retained `(timestamp, event)` pairs for the correlated-alert payload,
    /// newest last.
    pub fn window_events(&self, rule_id: &str, group_key: &str) -> Vec<Event> {
        self.buckets
            .get(&(rule_id.to_string(), group_key.to_string()))
            .map(|b| b.lock().entries.iter().map(|e| e.event.clone()).collect())
            .unwrap_or_default()
    }

    pub fn sweep(&self, now: DateTime<Utc>, idle_cutoff: chrono::Duration) {
        self.buckets
            .retain(|_, bucket| now - bucket.lock().last_active < idle_cutoff);
    }

    #[cfg(test)]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedCorrelationEngine = Arc<CorrelationEngine>;
