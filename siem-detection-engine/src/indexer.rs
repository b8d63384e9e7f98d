//! Bulk indexer (§4.8): batches enriched events per worker and writes them
//! to a daily index `siem-events-YYYY.MM.DD` via the OpenSearch `_bulk` API.
//! `@metadata` is stripped before indexing. Indexing is best-effort: a
//! batch that exhausts its retry budget is dropped with an error log, never
//! allowed to block detection (§4.8, §7 kind 1).
//!
//! Batches flush on whichever trigger comes first -- `batch_size` events
//! accumulated, or `batch_timeout` elapsed since the first event in the
//! batch -- mirroring the size+timeout dual trigger `siem_clickhouse_ingestion`
//! uses for its ClickHouse writer (§9.1).

use chrono::Utc;
use siem_common::error::Result;
use siem_common::time::Backoff;
use siem_schema::Event;
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_BULK_RETRIES: u32 = 5;

pub struct BulkIndexer {
    client: reqwest::Client,
    base_url: String,
    index_prefix: String,
    auth: Option<(String, String)>,
}

impl BulkIndexer {
    pub fn new(base_url: String, index_prefix: String, auth: Option<(String, String)>) -> Self {
        BulkIndexer {
            client: reqwest::Client::new(),
            base_url,
            index_prefix,
            auth,
        }
    }

    fn daily_index_name(&self) -> String {
        format!("{}-{}", self.index_prefix, Utc::now().format("%Y.%m.%d"))
    }

    /// Strips the `@metadata` sidecar (§4.3: "must not be indexed") and
    /// renders one `{index}\n{doc}\n` NDJSON pair per event for the bulk API.
    fn render_bulk_body(&self, events: &[Event]) -> String {
        let index = self.daily_index_name();
        let mut body = String::new();
        for event in events {
            let mut doc = event.0.clone();
            if let Some(obj) = doc.as_object_mut() {
                obj.remove("@metadata");
            }
            body.push_str(&serde_json::json!({"index": {"_index": index}}).to_string());
            body.push('\n');
            body.push_str(&doc.to_string());
            body.push('\n');
        }
        body
    }

    /// Writes `events` to the daily index with bounded exponential backoff
    /// (1s floor, 30s cap, 5 tries) and an on-the-wire `_bulk` request. On
    /// retry exhaustion the batch is dropped; the error is logged, never
    /// propagated to the caller (§4.8, §7 kind 1).
    pub async fn index_batch(&self, events: Vec<Event>) {
        if events.is_empty() {
            return;
        }
        let batch_size = events.len();
        let body = self.render_bulk_body(&events);
        let url = format!("{}/_bulk", self.base_url);

        let mut backoff = Backoff::standard();
        for attempt in 1..=MAX_BULK_RETRIES {
            match self.try_send(&url, &body).await {
                Ok(()) => {
                    info!(count = batch_size, attempt, "indexed batch");
                    return;
                }
                Err(e) => {
                    if attempt == MAX_BULK_RETRIES {
                        error!(count = batch_size, error = %e, "bulk index failed after retries, dropping batch");
                        return;
                    }
                    let delay = backoff.next_delay();
                    warn!(error = %e, attempt, delay_ms = delay.as_millis(), "bulk index failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn try_send(&self, url: &str, body: &str) -> Result<()> {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/x-ndjson")
            .body(body.to_string());
        if let Some((user, pass)) = &self.auth {
            request = request.basic_auth(user, Some(pass));
        }
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(siem_common::error::SiemError::indexing(format!(
                "bulk request returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
