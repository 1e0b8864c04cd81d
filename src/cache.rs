//! In-memory caching using moka
//!
//! Caches the reference data every quote reads: lockers, conversion factors
//! and reward tiers. Rates change rarely, so entries live for minutes.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::quoting::models::{ConversionFactor, Locker, RewardTier};
use crate::quoting::queries;

const REWARD_TIERS_KEY: &str = "reward_tiers";

/// Application cache holding quoting reference data
#[derive(Clone)]
pub struct AppCache {
    /// Lockers (id -> Locker)
    pub lockers: Cache<Uuid, Arc<Locker>>,
    /// Conversion factors (id -> ConversionFactor)
    pub factors: Cache<i32, Arc<ConversionFactor>>,
    /// Reward tiers (singleton list)
    pub reward_tiers: Cache<String, Arc<Vec<RewardTier>>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Lockers: 500 entries, 30 min TTL, 10 min idle
            lockers: Cache::builder()
                .max_capacity(500)
                .time_to_live(Duration::from_secs(30 * 60))
                .time_to_idle(Duration::from_secs(10 * 60))
                .build(),

            // Conversion factors: one per transport mode, 1 hour TTL
            factors: Cache::builder()
                .max_capacity(16)
                .time_to_live(Duration::from_secs(60 * 60))
                .build(),

            // Reward tiers: 1 entry, 15 min TTL
            reward_tiers: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(15 * 60))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            lockers_size: self.lockers.entry_count(),
            factors_size: self.factors.entry_count(),
            reward_tiers_cached: self.reward_tiers.entry_count() > 0,
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.lockers.invalidate_all();
        self.factors.invalidate_all();
        self.reward_tiers.invalidate_all();
        info!("All caches invalidated");
    }

    /// Get a locker, querying the database on a miss
    pub async fn locker(
        &self,
        db: &PgPool,
        locker_id: Uuid,
    ) -> crate::error::Result<Option<Arc<Locker>>> {
        if let Some(cached) = self.lockers.get(&locker_id).await {
            tracing::debug!("Cache HIT for locker: {}", locker_id);
            return Ok(Some(cached));
        }
        tracing::debug!("Cache MISS for locker: {}", locker_id);

        match queries::get_locker(db, locker_id).await? {
            Some(locker) => {
                let locker = Arc::new(locker);
                self.lockers.insert(locker_id, locker.clone()).await;
                Ok(Some(locker))
            }
            None => Ok(None),
        }
    }

    /// Get a conversion factor, querying the database on a miss
    pub async fn factor(
        &self,
        db: &PgPool,
        factor_id: i32,
    ) -> crate::error::Result<Option<Arc<ConversionFactor>>> {
        if let Some(cached) = self.factors.get(&factor_id).await {
            return Ok(Some(cached));
        }

        match queries::get_conversion_factor(db, factor_id).await? {
            Some(factor) => {
                let factor = Arc::new(factor);
                self.factors.insert(factor_id, factor.clone()).await;
                Ok(Some(factor))
            }
            None => Ok(None),
        }
    }

    /// Get all reward tiers, querying the database on a miss
    pub async fn reward_tiers(&self, db: &PgPool) -> crate::error::Result<Arc<Vec<RewardTier>>> {
        if let Some(cached) = self.reward_tiers.get(REWARD_TIERS_KEY).await {
            return Ok(cached);
        }

        let tiers = Arc::new(queries::get_reward_tiers(db).await?);
        self.reward_tiers
            .insert(REWARD_TIERS_KEY.to_string(), tiers.clone())
            .await;
        Ok(tiers)
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
    pub lockers_size: u64,
    pub factors_size: u64,
    pub reward_tiers_cached: bool,
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes every `every`.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool, every: Duration) {
    let mut interval = interval(every);
    loop {
        // First tick completes immediately
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Warm the cache with commonly accessed data
async fn warm_cache(cache: &AppCache, db: &PgPool) {
    info!("Starting cache warm-up...");

    match queries::get_active_lockers(db).await {
        Ok(lockers) => {
            for locker in lockers {
                cache.lockers.insert(locker.id, Arc::new(locker)).await;
            }
        }
        Err(e) => warn!("Failed to warm locker cache: {}", e),
    }

    match queries::get_conversion_factors(db).await {
        Ok(factors) => {
            for factor in factors {
                cache.factors.insert(factor.id, Arc::new(factor)).await;
            }
        }
        Err(e) => warn!("Failed to warm conversion factor cache: {}", e),
    }

    match queries::get_reward_tiers(db).await {
        Ok(tiers) => {
            cache
                .reward_tiers
                .insert(REWARD_TIERS_KEY.to_string(), Arc::new(tiers))
                .await;
        }
        Err(e) => warn!("Failed to warm reward tier cache: {}", e),
    }

    cache.run_pending_tasks().await;
    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}

impl AppCache {
    async fn run_pending_tasks(&self) {
        self.lockers.run_pending_tasks().await;
        self.factors.run_pending_tasks().await;
        self.reward_tiers.run_pending_tasks().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_stats_reflect_inserts_and_invalidation() {
        let cache = AppCache::new();
        cache
            .factors
            .insert(
                1,
                Arc::new(ConversionFactor {
                    id: 1,
                    name: "Aéreo".to_string(),
                    divisor: dec!(5000),
                }),
            )
            .await;
        cache.run_pending_tasks().await;

        let stats = cache.stats();
        assert_eq!(stats.factors_size, 1);
        assert_eq!(stats.lockers_size, 0);
        assert!(!stats.reward_tiers_cached);

        cache.invalidate_all();
        assert!(cache.factors.get(&1).await.is_none());
    }
}
