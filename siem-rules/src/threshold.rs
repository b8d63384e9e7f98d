//! Threshold tracker (§4.7): per-`(rule.id, group_key)` sliding-window
//! counters. `condition` is parsed as `<metric> <op> <N>` where metric is
//! `count` or `unique_<field>`. Each bucket is a ring buffer capped at
//! `MAX_BUCKET_ENTRIES`; a janitor sweep evicts buckets idle for 2x their
//! rule's timeframe.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use siem_common::dotted::get_path;
use siem_common::error::{Result, SiemError};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// §4.7: "each bucket is capped at 10,000 entries; overflow drops the oldest".
pub const MAX_BUCKET_ENTRIES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdOp {
    Gt,
    Gte,
}

#[derive(Debug, Clone)]
pub enum Metric {
    Count,
    UniqueField(String),
}

#[derive(Debug, Clone)]
pub struct ThresholdCondition {
    pub metric: Metric,
    pub op: ThresholdOp,
    pub n: f64,
}

/// Parses `"count > 5"` / `"unique_ports > 50"` / `"unique_destination.port >= 10"`.
pub fn parse_condition(condition: &str) -> Result<ThresholdCondition> {
    let tokens: Vec<&str> = condition.split_whitespace().collect();
    let [metric_tok, op_tok, n_tok] = tokens[..] else {
        return Err(SiemError::rule_validation(format!(
            "malformed condition: {condition:?}, expected '<metric> <op> <N>'"
        )));
    };

    let op = match op_tok {
        ">" => ThresholdOp::Gt,
        ">=" => ThresholdOp::Gte,
        other => {
            return Err(SiemError::rule_validation(format!(
                "unsupported threshold operator: {other}"
            )))
        }
    };
    let n: f64 = n_tok
        .parse()
        .map_err(|_| SiemError::rule_validation(format!("invalid threshold N: {n_tok}")))?;

    let metric = if metric_tok == "count" {
        Metric::Count
    } else if let Some(field) = metric_tok.strip_prefix("unique_") {
        Metric::UniqueField(field.to_string())
    } else {
        return Err(SiemError::rule_validation(format!(
            "unsupported threshold metric: {metric_tok}"
        )));
    };

    Ok(ThresholdCondition { metric, op, n })
}

struct Entry {
    at: DateTime<Utc>,
    event: serde_json::Value,
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

    fn push(&mut self, now: DateTime<Utc>, event: serde_json::Value) {
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

/// Owned state object behind `Submit(rule_id, group_key, now, event) ->
/// bool`, per §9: each bucket guarded by its own lock (coarse-grained here
/// via a sharded map) rather than one global lock.
pub struct ThresholdTracker {
    buckets: DashMap<(String, String), Mutex<Bucket>>,
}

impl ThresholdTracker {
    pub fn new() -> Self {
        ThresholdTracker {
            buckets: DashMap::new(),
        }
    }

    /// Appends `event` to the bucket for `(rule_id, group_key)`, prunes
    /// entries older than `now - timeframe`, and evaluates `condition` over
    /// what remains. Returns true iff the condition holds (§4.6, §4.7).
    pub fn submit(
        &self,
        rule_id: &str,
        group_key: &str,
        now: DateTime<Utc>,
        timeframe: chrono::Duration,
        condition: &ThresholdCondition,
        event: &serde_json::Value,
    ) -> bool {
        let key = (rule_id.to_string(), group_key.to_string());
        let bucket_lock = self
            .buckets
            .entry(key)
            .or_insert_with(|| Mutex::new(Bucket::new(now)));
        let mut bucket = bucket_lock.lock();
        bucket.push(now, event.clone());
        let cutoff = now - timeframe;
        bucket.prune(cutoff);
        evaluate(&bucket.entries, condition)
    }

    /// §4.7: removes buckets idle for >= 2x their rule's timeframe. Callers
    /// run this on a fixed interval (e.g. 60s) from a dedicated janitor task.
    pub fn sweep(&self, now: DateTime<Utc>, idle_cutoff: chrono::Duration) {
        self.buckets
            .retain(|_, bucket| now - bucket.lock().last_active < idle_cutoff);
    }

    #[cfg(test)]
    pub fn bucket_len(&self, rule_id: &str, group_key: &str) -> usize {
        self.buckets
            .get(&(rule_id.to_string(), group_key.to_string()))
            .map(|b| b.lock().entries.len())
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl Default for ThresholdTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn evaluate(entries: &VecDeque<Entry>, condition: &ThresholdCondition) -> bool {
    let value = match &condition.metric {
        Metric::Count => entries.len() as f64,
        Metric::UniqueField(field) => {
            let set: HashSet<String> = entries
                .iter()
                .filter_map(|e| get_path(&e.event, field))
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            set.len() as f64
        }
    };
    match condition.op {
        ThresholdOp::Gt => value > condition.n,
        ThresholdOp::Gte => value >= condition.n,
    }
}

pub type SharedThresholdTracker = Arc<ThresholdTracker>;
