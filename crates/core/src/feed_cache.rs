//! Time-windowed cache for the global feed.
//!
//! Each page of the index is cached as its rendered body. New, edited or
//! deleted posts do not show up until the entry expires or the cache is
//! cleared.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use yatube_common::{AppResult, SharedPageCache};

use crate::pagination::PageNumber;

/// Key prefix for index pages.
pub const INDEX_KEY_PREFIX: &str = "index_page";

/// Cache of rendered index pages.
#[derive(Clone)]
pub struct FeedCache {
    cache: SharedPageCache,
    ttl: Duration,
}

impl FeedCache {
    /// Wrap a page cache; entries live for `ttl`.
    #[must_use]
    pub fn new(cache: SharedPageCache, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Cache key for one index page.
    #[must_use]
    pub fn index_key(page: PageNumber) -> String {
        format!("{INDEX_KEY_PREFIX}:{}", page.get())
    }

    /// Return the cached body for an index page, rendering and storing it on a miss.
    ///
    /// A failing cache backend degrades to rendering every time.
    pub async fn index_page<F, Fut>(&self, page: PageNumber, render: F) -> AppResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<String>>,
    {
        let key = Self::index_key(page);

        match self.cache.get(&key).await {
            Ok(Some(body)) => return Ok(body),
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "Page cache read failed"),
        }

        let body = render().await?;
        if let Err(e) = self.cache.set(&key, body.clone(), self.ttl).await {
            warn!(key = %key, error = %e, "Page cache write failed");
        }
        Ok(body)
    }

    /// Drop every cached page.
    pub async fn clear(&self) -> AppResult<()> {
        self.cache.clear().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use yatube_common::MemoryPageCache;

    fn feed_cache() -> FeedCache {
        FeedCache::new(Arc::new(MemoryPageCache::new()), Duration::from_secs(20))
    }

    #[tokio::test]
    async fn test_renders_once_per_window() {
        let cache = feed_cache();
        let renders = AtomicUsize::new(0);
        let counter = &renders;

        for _ in 0..3 {
            let body = cache
                .index_page(PageNumber::FIRST, move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok("A".to_string())
                })
                .await
                .unwrap();
            assert_eq!(body, "A");
        }

        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pages_are_cached_separately() {
        let cache = feed_cache();
        let first = cache
            .index_page(PageNumber::FIRST, || async { Ok("one".to_string()) })
            .await
            .unwrap();
        let second = cache
            .index_page(PageNumber::parse(Some("2")), || async { Ok("two".to_string()) })
            .await
            .unwrap();

        assert_eq!(first, "one");
        assert_eq!(second, "two");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rerenders_after_expiry() {
        let cache = feed_cache();
        cache
            .index_page(PageNumber::FIRST, || async { Ok("A".to_string()) })
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(21)).await;

        let body = cache
            .index_page(PageNumber::FIRST, || async { Ok("B".to_string()) })
            .await
            .unwrap();
        assert_eq!(body, "B");
    }

    #[tokio::test]
    async fn test_clear_forces_rerender() {
        let cache = feed_cache();
        cache
            .index_page(PageNumber::FIRST, || async { Ok("A".to_string()) })
            .await
            .unwrap();

        cache.clear().await.unwrap();

        let body = cache
            .index_page(PageNumber::FIRST, || async { Ok("B".to_string()) })
            .await
            .unwrap();
        assert_eq!(body, "B");
    }

    #[tokio::test]
    async fn test_render_error_is_not_cached() {
        let cache = feed_cache();
        let failed = cache
            .index_page(PageNumber::FIRST, || async {
                Err(yatube_common::AppError::Database("down".to_string()))
            })
            .await;
        assert!(failed.is_err());

        let body = cache
            .index_page(PageNumber::FIRST, || async { Ok("A".to_string()) })
            .await
            .unwrap();
        assert_eq!(body, "A");
    }
}
