//! Result Cache wrappers around the signal and catalog sources.
//!
//! Successful fetches are memoized whether they carry live or fallback data.
//! Errors are not cached.

use std::time::Duration;

use argus_clients::{AdapterError, TtlCache};
use argus_core::{BannerSignal, CatalogItem, Fetched};
use async_trait::async_trait;

use crate::sources::{CatalogSource, SignalSource};

/// Signals keyed by banner URL.
pub struct CachedSignalSource<S> {
    inner: S,
    cache: TtlCache<Fetched<BannerSignal>>,
}

impl<S> CachedSignalSource<S> {
    pub fn new(inner: S, ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl, max_entries),
        }
    }
}

#[async_trait]
impl<S: SignalSource> SignalSource for CachedSignalSource<S> {
    async fn fetch_signal(&self, banner_url: &str) -> Result<Fetched<BannerSignal>, AdapterError> {
        self.cache
            .get_or_try_insert_with(banner_url, || self.inner.fetch_signal(banner_url))
            .await
    }
}

/// Catalog listings keyed by catalog id.
pub struct CachedCatalogSource<S> {
    inner: S,
    cache: TtlCache<Fetched<Vec<CatalogItem>>>,
}

impl<S> CachedCatalogSource<S> {
    pub fn new(inner: S, ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl, max_entries),
        }
    }
}

#[async_trait]
impl<S: CatalogSource> CatalogSource for CachedCatalogSource<S> {
    async fn fetch_items(
        &self,
        catalog_id: &str,
    ) -> Result<Fetched<Vec<CatalogItem>>, AdapterError> {
        self.cache
            .get_or_try_insert_with(catalog_id, || self.inner.fetch_items(catalog_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use argus_core::DiscountRange;

    use super::*;

    #[derive(Default)]
    struct CountingSignals {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SignalSource for CountingSignals {
        async fn fetch_signal(
            &self,
            _banner_url: &str,
        ) -> Result<Fetched<BannerSignal>, AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Fetched::fallback(BannerSignal::new(
                vec!["Nike".to_string()],
                Some(DiscountRange::new(20.0, 50.0)),
            )))
        }
    }

    #[derive(Default)]
    struct FlakyCatalog {
        calls: AtomicU32,
    }

    #[async_trait]
    impl CatalogSource for FlakyCatalog {
        async fn fetch_items(
            &self,
            _catalog_id: &str,
        ) -> Result<Fetched<Vec<CatalogItem>>, AdapterError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(AdapterError::MissingContent {
                    context: "test".to_string(),
                });
            }
            Ok(Fetched::live(vec![CatalogItem::new("P1", Some("Nike"), Some(30.0))]))
        }
    }

    #[tokio::test]
    async fn fallback_values_are_cached_like_live_ones() {
        let cached = CachedSignalSource::new(CountingSignals::default(), Duration::from_secs(60), 16);

        let first = cached.fetch_signal("https://cdn.example.com/a.jpg").await.expect("fetch");
        let second = cached.fetch_signal("https://cdn.example.com/a.jpg").await.expect("fetch");
        cached.fetch_signal("https://cdn.example.com/b.jpg").await.expect("fetch");

        assert!(first.is_fallback());
        assert_eq!(first, second);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cached = CachedCatalogSource::new(FlakyCatalog::default(), Duration::from_secs(60), 16);

        assert!(cached.fetch_items("83").await.is_err());
        let items = cached.fetch_items("83").await.expect("second call succeeds");
        assert_eq!(items.value.len(), 1);
        cached.fetch_items("83").await.expect("cached");

        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }
}
