//! In-memory caching using moka
//!
//! Provides application-level caching for property pages and listings.
//! Properties only change through admin edits, which invalidate explicitly.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Property, PropertyFilter};
use crate::store::Store;

/// Application cache holding property details and listings
#[derive(Clone)]
pub struct AppCache {
    /// Property detail (id -> Property)
    pub properties: Cache<Uuid, Arc<Property>>,
    /// Filtered listings (filter cache_key -> properties)
    pub listings: Cache<String, Arc<Vec<Property>>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Property detail: 1000 entries, 30 min TTL, 10 min idle
            properties: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(Duration::from_secs(30 * 60))
                .time_to_idle(Duration::from_secs(10 * 60))
                .build(),

            // Listings: one entry per distinct filter, 5 min TTL
            listings: Cache::builder()
                .max_capacity(200)
                .time_to_live(Duration::from_secs(5 * 60))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            properties_size: self.properties.entry_count(),
            listings_size: self.listings.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.properties.invalidate_all();
        self.listings.invalidate_all();
        info!("All caches invalidated");
    }

    /// Invalidate one property and every listing that might include it
    pub async fn invalidate_property(&self, id: Uuid) {
        self.properties.invalidate(&id).await;
        self.listings.invalidate_all();
        info!("Cache invalidated for property: {}", id);
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub properties_size: u64,
    pub listings_size: u64,
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes every 10 minutes.
pub async fn start_cache_warmer(cache: AppCache, store: Arc<dyn Store>) {
    let mut interval = interval(Duration::from_secs(10 * 60));
    loop {
        // First tick completes immediately
        interval.tick().await;
        warm_cache(&cache, store.as_ref()).await;
    }
}

/// Warm the unfiltered listing and the details of every listed property
async fn warm_cache(cache: &AppCache, store: &dyn Store) {
    info!("Starting cache warm-up...");

    let filter = PropertyFilter::default();
    match store.list_properties(&filter).await {
        Ok(properties) => {
            for property in &properties {
                cache
                    .properties
                    .insert(property.id, Arc::new(property.clone()))
                    .await;
            }
            cache
                .listings
                .insert(filter.cache_key(), Arc::new(properties))
                .await;
        }
        Err(e) => warn!("Failed to warm property listing cache: {}", e),
    }

    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProperty;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_warm_and_invalidate() {
        let store = MemoryStore::new();
        let property = store
            .create_property(NewProperty {
                name: "Tea Estate Bungalow".to_string(),
                location: "Munnar".to_string(),
                description: String::new(),
                category: "mountain".to_string(),
                aesthetic_tags: vec!["colonial".to_string()],
                max_guests: 6,
                bedrooms: 3,
                bathrooms: 2,
                price_per_night: dec!(8500),
                image_urls: vec![],
                features: vec![],
                testimonials: vec![],
                pets_allowed: false,
            })
            .await
            .unwrap();

        let cache = AppCache::new();
        warm_cache(&cache, &store).await;

        assert!(cache.properties.get(&property.id).await.is_some());
        let key = PropertyFilter::default().cache_key();
        assert_eq!(cache.listings.get(&key).await.unwrap().len(), 1);

        cache.invalidate_property(property.id).await;
        assert!(cache.properties.get(&property.id).await.is_none());
        assert!(cache.listings.get(&key).await.is_none());
    }
}
