//! A thin wrapper around a Redis list used as a FIFO queue: producers
//! `LPUSH`, consumers `RPOP` (or block on `BRPOP`), matching the queue
//! semantics `events:raw` and `alerts:queue` are built on (§4.1, §4.7).

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use siem_common::error::{Result, SiemError};
use siem_common::time::Backoff;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Clone)]
pub struct QueueClient {
    manager: ConnectionManager,
}

impl QueueClient {
    /// Connects to `redis_url` and wraps the connection in a
    /// `ConnectionManager`, which reconnects transparently on transport
    /// errors -- callers don't need their own reconnect loop for anything
    /// but the initial dial.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let mut backoff = Backoff::standard();
        loop {
            let client = redis::Client::open(redis_url)
                .map_err(|e| SiemError::queue(format!("invalid redis url: {e}")))?;
            match client.get_connection_manager().await {
                Ok(manager) => return Ok(QueueClient { manager }),
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(error = %e, delay_ms = delay.as_millis(), "redis connect failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// `LPUSH list value` -- pushes onto the head so `RPOP` drains in
    /// arrival order.
    pub async fn push(&self, list: &str, value: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.lpush::<_, _, ()>(list, value)
            .await
            .map_err(SiemError::from)
    }

    /// Non-blocking `RPOP`. Returns `Ok(None)` when the list is empty rather
    /// than an error, so callers can distinguish "nothing to do" from an
    /// actual transport failure.
    pub async fn pop_right(&self, list: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.rpop(list, None).await.map_err(SiemError::from)?;
        Ok(value)
    }

    /// `BRPOP` with the given timeout. Returns `Ok(None)` on timeout.
    pub async fn pop_right_blocking(
        &self,
        list: &str,
        timeout: Duration,
    ) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        let result: Option<(String, String)> = conn
            .brpop(list, timeout.as_secs_f64())
            .await
            .map_err(SiemError::from)?;
        Ok(result.map(|(_, value)| value))
    }

    /// Current queue depth, used for worker backpressure decisions and
    /// startup logging.
    pub async fn len(&self, list: &str) -> Result<u64> {
        let mut conn = self.manager.clone();
        conn.llen(list).await.map_err(SiemError::from)
    }
}

/// Pulls up to `batch_size` items off `list` without blocking, stopping
/// early once the list is drained. Mirrors the detection engine's batch
/// pull loop (§4.1): a bounded number of non-blocking `RPOP`s rather than
/// one `BRPOP` per item.
pub async fn pull_batch(
    client: &QueueClient,
    list: &str,
    batch_size: usize,
) -> Result<Vec<String>> {
    let mut batch = Vec::with_capacity(batch_size);
    for _ in 0..batch_size {
        match client.pop_right(list).await? {
            Some(item) => batch.push(item),
            None => break,
        }
    }
    if !batch.is_empty() {
        info!(count = batch.len(), list, "pulled batch");
    }
    Ok(batch)
}
