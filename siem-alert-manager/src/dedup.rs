//! Alert deduplication (§4.9, §8): two alerts with the same
//! `hash(rule.id, source.ip, destination.ip)` arriving within the dedup
//! window produce exactly one delivery. A periodic sweep evicts entries
//! older than 2x the window so the map doesn't grow unbounded.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use md5::{Digest, Md5};

pub struct DedupTracker {
    last_seen: DashMap<String, DateTime<Utc>>,
    window: chrono::Duration,
}

impl DedupTracker {
    pub fn new(window: chrono::Duration) -> Self {
        DedupTracker {
            last_seen: DashMap::new(),
            window,
        }
    }

    /// `§3`: `hash(rule.id, source.ip, destination.ip)`.
    pub fn dedup_key(rule_id: &str, source_ip: &str, destination_ip: &str) -> String {
        let material = format!("{rule_id}:{source_ip}:{destination_ip}");
        let mut hasher = Md5::new();
        hasher.update(material.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Returns true if this alert should be delivered (first time, or the
    /// window has elapsed since the last occurrence). Records `now` only
    /// when the alert is delivered; a suppressed alert does not advance
    /// the window (§4.9 step 1).
    pub fn should_deliver(&self, key: &str, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_seen.get(key) {
            if now - *last < self.window {
                return false;
            }
        }
        self.last_seen.insert(key.to_string(), now);
        true
    }

    pub fn sweep(&self, now: DateTime<Utc>) {
        let cutoff = self.window * 2;
        self.last_seen.retain(|_, last| now - *last < cutoff);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_is_stable_for_same_inputs() {
        let a = DedupTracker::dedup_key("auth-001", "1.2.3.4", "5.6.7.8");
        let b = DedupTracker::dedup_key("auth-001", "1.2.3.4", "5.6.7.8");
        assert_eq!(a, b);
        let c = DedupTracker::dedup_key("auth-001", "1.2.3.4", "9.9.9.9");
        assert_ne!(a, c);
    }

    #[test]
    fn second_alert_within_window_is_suppressed() {
        let tracker = DedupTracker::new(chrono::Duration::seconds(300));
        let key = "k";
        let base = Utc::now();
        assert!(tracker.should_deliver(key, base));
        assert!(!tracker.should_deliver(key, base + chrono::Duration::seconds(30)));
    }

    #[test]
    fn alert_after_window_elapses_is_delivered_again() {
        let tracker = DedupTracker::new(chrono::Duration::seconds(300));
        let key = "k";
        let base = Utc::now();
        assert!(tracker.should_deliver(key, base));
        assert!(tracker.should_deliver(key, base + chrono::Duration::seconds(301)));
    }

    #[test]
    fn sweep_evicts_entries_older_than_twice_the_window() {
        let tracker = DedupTracker::new(chrono::Duration::seconds(300));
        let base = Utc::now();
        tracker.should_deliver("k", base);
        assert_eq!(tracker.len(), 1);
        tracker.sweep(base + chrono::Duration::seconds(601));
        assert_eq!(tracker.len(), 0);
    }
}
