//! TTL cache for per-token maker fee rates.
//!
//! Fee rates change rarely but feed every quote-size decision, so they
//! are cached rather than fetched per refresh cycle. Entries expire
//! after a configurable TTL; expired entries are evicted lazily on read.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;

use pmq_core::TokenId;

#[derive(Debug, Clone)]
struct CachedRate {
    rate: Decimal,
    cached_at: DateTime<Utc>,
}

/// Concurrent fee-rate cache keyed by token.
#[derive(Debug)]
pub struct FeeCache {
    entries: DashMap<TokenId, CachedRate>,
    ttl: Duration,
}

impl FeeCache {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Get a cached rate if it is still fresh at `now`.
    ///
    /// Stale entries are removed on the way out.
    pub fn get(&self, token: &TokenId, now: DateTime<Utc>) -> Option<Decimal> {
        // Read guard must be released before removal on the same shard.
        let fresh = self
            .entries
            .get(token)
            .map(|entry| (entry.rate, now - entry.cached_at < self.ttl));
        match fresh {
            Some((rate, true)) => Some(rate),
            Some((_, false)) => {
                self.entries.remove(token);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, token: TokenId, rate: Decimal, now: DateTime<Utc>) {
        self.entries.insert(
            token,
            CachedRate {
                rate,
                cached_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fresh_entry_is_returned() {
        let cache = FeeCache::new(300);
        let now = Utc::now();
        cache.insert(TokenId::from("tok"), dec!(0.0015), now);

        assert_eq!(
            cache.get(&TokenId::from("tok"), now + Duration::seconds(299)),
            Some(dec!(0.0015))
        );
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let cache = FeeCache::new(300);
        let now = Utc::now();
        cache.insert(TokenId::from("tok"), dec!(0.0015), now);

        assert_eq!(
            cache.get(&TokenId::from("tok"), now + Duration::seconds(300)),
            None
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reinsert_refreshes_ttl() {
        let cache = FeeCache::new(300);
        let now = Utc::now();
        cache.insert(TokenId::from("tok"), dec!(0.0015), now);
        cache.insert(
            TokenId::from("tok"),
            dec!(0.0020),
            now + Duration::seconds(200),
        );

        assert_eq!(
            cache.get(&TokenId::from("tok"), now + Duration::seconds(400)),
            Some(dec!(0.0020))
        );
    }

    #[test]
    fn test_miss_on_unknown_token() {
        let cache = FeeCache::new(300);
        assert_eq!(cache.get(&TokenId::from("other"), Utc::now()), None);
    }
}
