//! # Resource Cache
//!
//! Font resolution and logo decoding are the two expensive, repeatable steps
//! of a render. Their outcomes are memoized here, keyed by the identifier the
//! template uses (family string, logo reference), including failures so a
//! broken logo URL is not refetched on every invoice.
//!
//! The cache is an ordinary value. Wrap it in an `Arc` and hand it to as many
//! engines as should share it: one per batch, one per process, or one per
//! render. Each key owns a [`tokio::sync::OnceCell`], so concurrent first use
//! of the same key runs a single population and everyone else awaits it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OnceCell;

use crate::error::ResourceError;
use crate::font::FontFamily;
use crate::image_loader::LoadedImage;

type Slot<T> = Arc<OnceCell<Result<Arc<T>, ResourceError>>>;

/// The observable state of one cache key.
#[derive(Debug, Clone)]
pub enum CacheEntry<T> {
    /// Population has started but not finished.
    Pending,
    Resolved(Arc<T>),
    Failed(ResourceError),
}

/// A get-or-populate map from identifier to resource.
pub struct ResourceMap<T> {
    name: &'static str,
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T> ResourceMap<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(HashMap::new()),
        }
    }

    // A panic while holding the lock cannot leave the map half-updated, so
    // a poisoned lock is still usable.
    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot<T>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached outcome for `key`, running `populate` if this is
    /// the first request for it. Failures are cached like successes.
    pub async fn get_or_populate<F, Fut>(&self, key: &str, populate: F) -> Result<Arc<T>, ResourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ResourceError>>,
    {
        let slot = self.slots().entry(key.to_string()).or_default().clone();
        slot.get_or_init(|| async {
            log::debug!("Populating {} cache entry '{}'", self.name, key);
            populate().await.map(Arc::new)
        })
        .await
        .clone()
    }

    pub fn entry(&self, key: &str) -> Option<CacheEntry<T>> {
        let slot = self.slots().get(key)?.clone();
        Some(match slot.get() {
            None => CacheEntry::Pending,
            Some(Ok(value)) => CacheEntry::Resolved(value.clone()),
            Some(Err(e)) => CacheEntry::Failed(e.clone()),
        })
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots().clear();
    }
}

/// Entry counts per map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub fonts: usize,
    pub logos: usize,
}

/// Font and logo caches shared across renders.
pub struct ResourceCache {
    fonts: ResourceMap<FontFamily>,
    logos: ResourceMap<LoadedImage>,
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCache {
    pub fn new() -> Self {
        Self {
            fonts: ResourceMap::new("font"),
            logos: ResourceMap::new("logo"),
        }
    }

    /// Keyed by the font family string as written in the template.
    pub fn fonts(&self) -> &ResourceMap<FontFamily> {
        &self.fonts
    }

    /// Keyed by the logo reference (URL, data URI or path).
    pub fn logos(&self) -> &ResourceMap<LoadedImage> {
        &self.logos
    }

    pub fn clear_all(&self) {
        self.fonts.clear();
        self.logos.clear();
        log::debug!("Resource cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            fonts: self.fonts.len(),
            logos: self.logos.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::StandardFamily;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn populates_once_per_key() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let family = cache
                .fonts()
                .get_or_populate("Arial", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(FontFamily::Standard(StandardFamily::Helvetica))
                })
                .await
                .unwrap();
            assert_eq!(family.name(), "Helvetica");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats(), CacheStats { fonts: 1, logos: 0 });
    }

    #[tokio::test]
    async fn failures_are_cached() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let result = cache
                .logos()
                .get_or_populate("https://example.invalid/logo.png", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ResourceError::NotFound("logo".to_string()))
                })
                .await;
            assert!(result.is_err());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            cache.logos().entry("https://example.invalid/logo.png"),
            Some(CacheEntry::Failed(ResourceError::NotFound(_)))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_runs_one_population() {
        let cache = Arc::new(ResourceCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    cache
                        .fonts()
                        .get_or_populate("Georgia", || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::task::yield_now().await;
                            Ok(FontFamily::Standard(StandardFamily::Times))
                        })
                        .await
                        .map(|f| f.name().to_string())
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "Times");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_all_empties_both_maps() {
        let cache = ResourceCache::new();
        let _ = cache
            .fonts()
            .get_or_populate("Courier", || async {
                Ok(FontFamily::Standard(StandardFamily::Courier))
            })
            .await;
        assert!(cache.logos().entry("missing").is_none());
        assert_eq!(cache.stats().fonts, 1);
        cache.clear_all();
        assert_eq!(cache.stats(), CacheStats::default());
        assert!(cache.fonts().entry("Courier").is_none());
    }
}
