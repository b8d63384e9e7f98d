//! The enrichment chain (§4.4): an ordered list of pure-ish `Enrich(event)
//! -> event` capabilities -- GeoIP, reverse DNS, threat intel -- composed
//! with no inheritance, each a no-op when its prerequisite field is absent.

pub mod dns;
pub mod geoip;
pub mod threat_intel;

use siem_schema::Event;
use tracing::warn;

/// A single enrichment step. Implementations must not remove fields and
/// must be a no-op when the fields they key off are absent (§4.4).
#[async_trait::async_trait]
pub trait Enricher: Send + Sync {
    fn name(&self) -> &'static str;
    async fn enrich(&self, event: &mut Event);
}

/// The ordered enrichment chain. A failure in one enricher is logged at
/// warn and the event carries on as-is (§7 kind 3) -- enrichment never
/// drops an event or halts the chain.
pub struct EnrichmentChain {
    enrichers: Vec<Box<dyn Enricher>>,
}

impl EnrichmentChain {
    pub fn new(enrichers: Vec<Box<dyn Enricher>>) -> Self {
        EnrichmentChain { enrichers }
    }

    pub async fn run(&self, event: &mut Event) {
        for enricher in &self.enrichers {
            let before = event.clone();
            enricher.enrich(event).await;
            if let Err(msg) = assert_no_field_removed(&before, event) {
                warn!(enricher = enricher.name(), error = %msg, "enricher removed fields, ignoring");
                *event = before;
            }
        }
    }
}

/// §4.4: "may add fields, must not remove them". Checked defensively since
/// enrichers are third-party-ish capabilities composed at runtime.
fn assert_no_field_removed(before: &Event, after: &Event) -> Result<(), String> {
    fn has_all_keys(before: &serde_json::Value, after: &serde_json::Value) -> bool {
        match (before, after) {
            (serde_json::Value::Object(b), serde_json::Value::Object(a)) => b.iter().all(|(k, v)| {
                a.get(k)
                    .map(|av| has_all_keys(v, av))
                    .unwrap_or(false)
            }),
            _ => true,
        }
    }
    if has_all_keys(before, after) {
        Ok(())
    } else {
        Err("a field present before enrichment is missing after".to_string())
    }
}
