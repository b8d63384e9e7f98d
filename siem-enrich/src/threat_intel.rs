//! Threat intel enrichment (§4.4): a static indicator set loaded from a JSON
//! feed at startup (grounded on the on-disk IOC shape `siem_threat_intel`
//! writes to its store -- `ioc_type`/`ioc_value`/`source`), matched against
//! `source.ip`, `destination.ip`, and `dns.question.name`.

use crate::Enricher;
use serde::Deserialize;
use serde_json::json;
use siem_common::error::{Result, SiemError};
use siem_schema::Event;
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Indicator {
    #[serde(rename = "ioc_type")]
    pub indicator_type: String,
    #[serde(rename = "ioc_value")]
    pub value: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// Indicators partitioned by type for O(1) matching; `value` is matched
/// case-sensitively for IPs and file hashes, case-insensitively for domains.
pub struct ThreatIntelEnricher {
    ips: HashSet<String>,
    domains: HashSet<String>,
    hashes: HashSet<String>,
}

impl ThreatIntelEnricher {
    pub fn empty() -> Self {
        ThreatIntelEnricher {
            ips: HashSet::new(),
            domains: HashSet::new(),
            hashes: HashSet::new(),
        }
    }

    pub fn from_indicators(indicators: Vec<Indicator>) -> Self {
        let mut ips = HashSet::new();
        let mut domains = HashSet::new();
        let mut hashes = HashSet::new();
        for ind in indicators {
            match ind.indicator_type.as_str() {
                "ipv4" | "ipv6" | "ip" => {
                    ips.insert(ind.value);
                }
                "domain" => {
                    domains.insert(ind.value.to_lowercase());
                }
                "hash" | "md5" | "sha1" | "sha256" => {
                    hashes.insert(ind.value.to_lowercase());
                }
                _ => {
                    ips.insert(ind.value);
                }
            }
        }
        ThreatIntelEnricher { ips, domains, hashes }
    }

    /// Loads a JSON array of `{ioc_type, ioc_value, source}` records from
    /// `path` (§4.4). A missing feed is a startup concern for the caller to
    /// decide on, not silently swallowed here.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let indicators: Vec<Indicator> = serde_json::from_str(&raw)?;
        Ok(Self::from_indicators(indicators))
    }

    fn match_ip(&self, ip: &str) -> bool {
        self.ips.contains(ip)
    }

    fn match_domain(&self, domain: &str) -> bool {
        self.domains.contains(&domain.to_lowercase())
    }

    #[allow(dead_code)]
    fn match_hash(&self, hash: &str) -> bool {
        self.hashes.contains(&hash.to_lowercase())
    }
}

#[async_trait::async_trait]
impl Enricher for ThreatIntelEnricher {
    fn name(&self) -> &'static str {
        "threat_intel"
    }

    async fn enrich(&self, event: &mut Event) {
        if self.ips.is_empty() && self.domains.is_empty() && self.hashes.is_empty() {
            return;
        }

        let mut hits: Vec<serde_json::Value> = Vec::new();

        for field in ["source", "destination"] {
            let ip_path = format!("{field}.ip");
            if let Some(ip) = event.get_path(&ip_path).and_then(|v| v.as_str()) {
                if self.match_ip(ip) {
                    hits.push(json!({"type": "ip", "value": ip, "field": ip_path}));
                }
            }
        }

        if let Some(domain) = event.get_path("dns.question.name").and_then(|v| v.as_str()) {
            if self.match_domain(domain) {
                hits.push(json!({
                    "type": "domain",
                    "value": domain,
                    "field": "dns.question.name",
                }));
            }
        }

        if hits.is_empty() {
            return;
        }

        let existing = event
            .get_path("threat.indicators")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        let merged: Vec<serde_json::Value> = existing.into_iter().chain(hits).collect();
        event.set_path("threat.indicators", serde_json::Value::Array(merged));
        event.set_path("threat.matched", json!(true));
    }
}

impl Default for ThreatIntelEnricher {
    fn default() -> Self {
        Self::empty()
    }
}

/// Groups loaded indicators by the field they will match against, primarily
/// useful for startup logging (`n ip / n domain / n hash indicators loaded`).
pub fn counts_by_type(indicators: &[Indicator]) -> HashMap<&'static str, usize> {
    let mut counts = HashMap::new();
    for ind in indicators {
        let key = match ind.indicator_type.as_str() {
            "ipv4" | "ipv6" | "ip" => "ip",
            "domain" => "domain",
            "hash" | "md5" | "sha1" | "sha256" => "hash",
            _ => "other",
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enricher() -> ThreatIntelEnricher {
        ThreatIntelEnricher::from_indicators(vec![
            Indicator {
                indicator_type: "ipv4".to_string(),
                value: "185.234.218.45".to_string(),
                source: Some("abuse.ch".to_string()),
            },
            Indicator {
                indicator_type: "domain".to_string(),
                value: "evil.example".to_string(),
                source: None,
            },
        ])
    }

    #[tokio::test]
    async fn matches_source_ip_and_appends_indicator() {
        let enricher = enricher();
        let mut event = Event::from_value(json!({"source": {"ip": "185.234.218.45"}}));
        enricher.enrich(&mut event).await;
        assert_eq!(event.get_path("threat.matched"), Some(&json!(true)));
        let indicators = event.get_path("threat.indicators").unwrap().as_array().unwrap();
        assert_eq!(indicators.len(), 1);
        assert_eq!(indicators[0]["type"], "ip");
    }

    #[tokio::test]
    async fn matches_dns_question_case_insensitively() {
        let enricher = enricher();
        let mut event = Event::from_value(json!({"dns": {"question": {"name": "EVIL.example"}}}));
        enricher.enrich(&mut event).await;
        assert_eq!(event.get_path("threat.matched"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn no_match_leaves_event_untouched() {
        let enricher = enricher();
        let mut event = Event::from_value(json!({"source": {"ip": "1.2.3.4"}}));
        enricher.enrich(&mut event).await;
        assert!(event.get_path("threat.matched").is_none());
    }

    #[tokio::test]
    async fn empty_enricher_is_noop() {
        let enricher = ThreatIntelEnricher::empty();
        let mut event = Event::from_value(json!({"source": {"ip": "185.234.218.45"}}));
        enricher.enrich(&mut event).await;
        assert!(event.get_path("threat.matched").is_none());
    }
}
