//! Per-rule throttling (§4.9, §8): retains delivery timestamps within the
//! last `window` (default 3600s) and drops once the count exceeds `limit`
//! (default 100) for that `rule.id`.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;

pub struct ThrottleTracker {
    deliveries: DashMap<String, Mutex<VecDeque<DateTime<Utc>>>>,
    window: chrono::Duration,
    limit: usize,
}

impl ThrottleTracker {
    pub fn new(window: chrono::Duration, limit: usize) -> Self {
        ThrottleTracker {
            deliveries: DashMap::new(),
            window,
            limit,
        }
    }

    /// Returns true if this delivery is allowed. Prunes timestamps outside
    /// `window` first, then admits iff the retained count is still below
    /// `limit`; an admitted delivery is itself recorded.
    pub fn allow(&self, rule_id: &str, now: DateTime<Utc>) -> bool {
        let entry = self
            .deliveries
            .entry(rule_id.to_string())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut deque = entry.lock();
        let cutoff = now - self.window;
        while let Some(front) = deque.front() {
            if *front < cutoff {
                deque.pop_front();
            } else {
                break;
            }
        }
        if deque.len() >= self.limit {
            return false;
        }
        deque.push_back(now);
        true
    }

    #[cfg(test)]
    pub fn delivered_count(&self, rule_id: &str) -> usize {
        self.deliveries
            .get(rule_id)
            .map(|d| d.lock().len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_drops() {
        let tracker = ThrottleTracker::new(chrono::Duration::seconds(3600), 100);
        let base = Utc::now();
        let mut allowed = 0;
        for i in 0..150 {
            if tracker.allow("auth-001", base + chrono::Duration::seconds(i)) {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 100);
        assert_eq!(tracker.delivered_count("auth-001"), 100);
    }

    #[test]
    fn separate_rules_have_independent_budgets() {
        let tracker = ThrottleTracker::new(chrono::Duration::seconds(3600), 1);
        let now = Utc::now();
        assert!(tracker.allow("a", now));
        assert!(tracker.allow("b", now));
        assert!(!tracker.allow("a", now));
    }

    #[test]
    fn old_deliveries_age_out_of_the_window() {
        let tracker = ThrottleTracker::new(chrono::Duration::seconds(3600), 1);
        let base = Utc::now();
        assert!(tracker.allow("a", base));
        assert!(!tracker.allow("a", base + chrono::Duration::seconds(100)));
        assert!(tracker.allow("a", base + chrono::Duration::seconds(3601)));
    }
}
