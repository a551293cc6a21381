use std::{
    collections::HashMap,
    future::Future,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;

struct Slot<T> {
    value: T,
    expires_at: Instant,
}

/// Keyed values that expire after a fixed TTL. A zero TTL disables caching.
pub struct TimedCache<T> {
    slots: RwLock<HashMap<String, Slot<T>>>,
    ttl: Duration,
}

impl<T: Clone + Send + Sync> TimedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        let slots = self.slots.read().await;
        slots
            .get(key)
            .filter(|slot| Instant::now() < slot.expires_at)
            .map(|slot| slot.value.clone())
    }

    pub async fn set(&self, key: &str, value: T) {
        if self.ttl.is_zero() {
            return;
        }

        let mut slots = self.slots.write().await;
        slots.insert(
            key.to_owned(),
            Slot {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Cached value for `key`, or the result of `load` stored under it.
    /// Errors are returned as is and never cached.
    pub async fn get_or_load<F, Fut, E>(&self, key: &str, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = load().await?;
        self.set(key, value.clone()).await;
        Ok(value)
    }
}

impl<T> std::fmt::Debug for TimedCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCache").field("ttl", &self.ttl).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn loads_once_within_ttl() {
        let cache = TimedCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<u64, ()> = cache
                .get_or_load("stats", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(value, Ok(7));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_ttl_never_caches() {
        let cache = TimedCache::new(Duration::ZERO);
        cache.set("stats", 1_u64).await;
        assert_eq!(cache.get("stats").await, None);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache: TimedCache<u64> = TimedCache::new(Duration::from_secs(60));

        let failed: Result<u64, &str> =
            cache.get_or_load("stats", || async { Err("down") }).await;
        assert_eq!(failed, Err("down"));
        assert_eq!(cache.get("stats").await, None);
    }
}
