// Time-bounded memo of the last discovery result.
//
// Source pages are scraped at most once per TTL so the upstream server never
// sees more than one round of requests per window, however often runs are
// triggered.

use geodata_scanner::{LinkResolver, ResolvedLink};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct CacheEntry {
    links: Vec<ResolvedLink>,
    computed_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.computed_at.elapsed() <= ttl
    }
}

/// Single-slot discovery cache in front of a [`LinkResolver`].
pub struct DiscoveryCache {
    resolver: LinkResolver,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
}

impl DiscoveryCache {
    pub fn new(resolver: LinkResolver, ttl: Duration) -> Self {
        Self {
            resolver,
            ttl,
            entry: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached links while they are fresh, otherwise scan the
    /// sources again and replace the entry.
    ///
    /// The slot stays locked while scanning, so concurrent callers wait for
    /// the one scan in progress instead of starting their own.
    pub async fn get_links(&self) -> Vec<ResolvedLink> {
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref()
            && cached.is_fresh(self.ttl)
        {
            debug!(
                "Discovery cache hit ({}s old)",
                cached.computed_at.elapsed().as_secs()
            );
            return cached.links.clone();
        }

        info!("Discovery cache miss, scanning source pages");
        let links = self.resolver.resolve_links().await;
        *entry = Some(CacheEntry {
            links: links.clone(),
            computed_at: Instant::now(),
        });
        links
    }

    /// Whether the next [`get_links`](Self::get_links) call would be served
    /// without network access.
    pub async fn is_fresh(&self) -> bool {
        self.entry
            .lock()
            .await
            .as_ref()
            .is_some_and(|cached| cached.is_fresh(self.ttl))
    }

    /// Age of the current entry, if any.
    pub async fn age(&self) -> Option<Duration> {
        self.entry
            .lock()
            .await
            .as_ref()
            .map(|cached| cached.computed_at.elapsed())
    }
}
