//! Reverse DNS enrichment (§4.4). Lookups are cached in a bounded LRU with
//! negative caching -- a failed lookup caches a tombstone for the same TTL
//! as a successful one, so a dead host doesn't get re-resolved every event.
//! At most two lookups happen per event (source, destination).

use crate::Enricher;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use lru::LruCache;
use parking_lot::Mutex;
use siem_schema::Event;
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::warn;

/// `None` in the cached entry means "lookup attempted and failed" -- the
/// tombstone. Entries expire on read after `ttl`, at which point a fresh
/// lookup is attempted.
struct CacheEntry {
    domain: Option<String>,
    cached_at: Instant,
}

pub struct ReverseDnsEnricher {
    resolver: Option<TokioAsyncResolver>,
    cache: Mutex<LruCache<IpAddr, CacheEntry>>,
    ttl: Duration,
}

impl ReverseDnsEnricher {
    /// §4.4: cache of at least 5,000 entries.
    pub const MIN_CAPACITY: usize = 5_000;

    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        let capacity = NonZeroUsize::new(capacity.max(Self::MIN_CAPACITY)).expect("capacity > 0");
        ReverseDnsEnricher {
            resolver: Some(resolver),
            cache: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn disabled() -> Self {
        let capacity = NonZeroUsize::new(Self::MIN_CAPACITY).expect("capacity > 0");
        ReverseDnsEnricher {
            resolver: None,
            cache: Mutex::new(LruCache::new(capacity)),
            ttl: Duration::from_secs(300),
        }
    }

    async fn resolve(&self, ip: IpAddr) -> Option<String> {
        if let Some(entry) = self.cache.lock().get(&ip) {
            if entry.cached_at.elapsed() < self.ttl {
                return entry.domain.clone();
            }
        }

        let Some(resolver) = self.resolver.as_ref() else {
            return None;
        };
        let domain = match resolver.reverse_lookup(ip).await {
            Ok(lookup) => lookup.iter().next().map(|name| name.to_string()),
            Err(e) => {
                warn!(ip = %ip, error = %e, "reverse DNS lookup failed, caching tombstone");
                None
            }
        };

        self.cache.lock().put(
            ip,
            CacheEntry {
                domain: domain.clone(),
                cached_at: Instant::now(),
            },
        );
        domain
    }
}

#[async_trait::async_trait]
impl Enricher for ReverseDnsEnricher {
    fn name(&self) -> &'static str {
        "reverse_dns"
    }

    async fn enrich(&self, event: &mut Event) {
        if self.resolver.is_none() {
            return;
        }
        for field in ["source", "destination"] {
            let ip_path = format!("{field}.ip");
            let Some(ip_str) = event.get_path(&ip_path).and_then(|v| v.as_str()) else {
                continue;
            };
            let Ok(ip) = ip_str.parse::<IpAddr>() else {
                continue;
            };
            if let Some(domain) = self.resolve(ip).await {
                event.set_path(&format!("{field}.domain"), serde_json::Value::String(domain));
            }
        }
    }
}
