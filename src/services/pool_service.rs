// src/services/pool_service.rs
//
// Pool Aggregator - merges per-source identifier lists into one balanced pool.
//
// CRITICAL RULES:
// - Per-source listing failures are logged and skipped; the build fails only
//   when every eligible source failed
// - Each surviving list is shuffled once, then capped, so no prolific source
//   dominates the pool
// - Lists are merged by round-robin interleaving: index 0 of every list
//   before any list's index 1
// - resolve_by_id dispatches on the identifier's tag prefix

use std::sync::Arc;

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::task::JoinSet;

use crate::domain::{Artwork, ArtworkId, FeedFilters};
use crate::error::{AppError, AppResult};
use crate::sources::ArtSource;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Ceiling on how many identifiers one source may contribute.
    pub per_source_cap: usize,
    /// Fixed seed for the per-source shuffle; None draws from entropy.
    pub shuffle_seed: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            per_source_cap: 350,
            shuffle_seed: None,
        }
    }
}

/// The merged candidate pool for one filter configuration.
///
/// Rebuilt on session start and on every filter change; the order is fixed
/// once built.
#[derive(Debug, Clone, Default)]
pub struct IdentifierPool {
    ids: Vec<ArtworkId>,
}

impl IdentifierPool {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: Vec<ArtworkId>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[ArtworkId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub struct PoolService {
    sources: Vec<Arc<dyn ArtSource>>,
    config: PoolConfig,
}

impl PoolService {
    pub fn new(sources: Vec<Arc<dyn ArtSource>>) -> Self {
        Self {
            sources,
            config: PoolConfig::default(),
        }
    }

    pub fn with_config(sources: Vec<Arc<dyn ArtSource>>, config: PoolConfig) -> Self {
        Self { sources, config }
    }

    /// Build the identifier pool for one filter configuration.
    ///
    /// Eligibility comes from the filters' selected source subset. Listing
    /// fans out concurrently across eligible sources with no ordering
    /// guarantee; only the final interleave order is deterministic given the
    /// shuffled per-source lists.
    pub async fn build(&self, filters: &FeedFilters) -> AppResult<IdentifierPool> {
        let eligible: Vec<Arc<dyn ArtSource>> = self
            .sources
            .iter()
            .filter(|s| filters.allows_source(s.tag()))
            .cloned()
            .collect();

        if eligible.is_empty() {
            return Err(AppError::AllSourcesFailed);
        }

        let mut set = JoinSet::new();
        for (slot, source) in eligible.iter().enumerate() {
            let source = Arc::clone(source);
            let filters = filters.clone();
            set.spawn(async move {
                let result = source.list_identifiers(&filters).await;
                (slot, source.tag().to_string(), result)
            });
        }

        // Collect by registration slot so the interleave order does not
        // depend on completion order.
        let mut lists: Vec<Option<Vec<ArtworkId>>> = vec![None; eligible.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((slot, _tag, Ok(ids))) => {
                    lists[slot] = Some(ids);
                }
                Ok((_slot, tag, Err(e))) => {
                    warn!("pool build: source '{}' failed to list: {}", tag, e);
                }
                Err(e) => {
                    warn!("pool build: listing task panicked: {}", e);
                }
            }
        }

        let mut survivors: Vec<Vec<ArtworkId>> = lists.into_iter().flatten().collect();
        if survivors.is_empty() {
            return Err(AppError::AllSourcesFailed);
        }

        let mut rng = match self.config.shuffle_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        for list in &mut survivors {
            list.shuffle(&mut rng);
            list.truncate(self.config.per_source_cap);
        }

        let longest = survivors.iter().map(Vec::len).max().unwrap_or(0);
        let mut ids = Vec::with_capacity(survivors.iter().map(Vec::len).sum());
        for index in 0..longest {
            for list in &survivors {
                if let Some(id) = list.get(index) {
                    ids.push(id.clone());
                }
            }
        }

        debug!(
            "pool build: {} identifiers from {} of {} sources",
            ids.len(),
            survivors.len(),
            eligible.len()
        );

        Ok(IdentifierPool { ids })
    }

    /// Dispatch resolution to the source owning the identifier's tag.
    pub async fn resolve_by_id(&self, id: &ArtworkId) -> AppResult<Artwork> {
        let source = self
            .sources
            .iter()
            .find(|s| s.tag() == id.tag())
            .ok_or_else(|| AppError::UnknownSource(id.tag().to_string()))?;

        source.resolve(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::MockSource;

    fn service(sources: Vec<MockSource>) -> PoolService {
        PoolService::new(
            sources
                .into_iter()
                .map(|s| Arc::new(s) as Arc<dyn ArtSource>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_round_robin_interleaving() {
        let service = service(vec![
            MockSource::with_count("met", 3),
            MockSource::with_count("aic", 3),
        ]);

        let pool = service.build(&FeedFilters::default()).await.unwrap();
        let tags: Vec<&str> = pool.ids().iter().map(|id| id.tag()).collect();
        assert_eq!(tags, vec!["met", "aic", "met", "aic", "met", "aic"]);
    }

    #[tokio::test]
    async fn test_interleaving_with_uneven_lists() {
        let service = service(vec![
            MockSource::with_count("met", 3),
            MockSource::with_count("aic", 1),
        ]);

        let pool = service.build(&FeedFilters::default()).await.unwrap();
        let tags: Vec<&str> = pool.ids().iter().map(|id| id.tag()).collect();
        // aic runs out after round 0; met fills the remainder.
        assert_eq!(tags, vec!["met", "aic", "met", "met"]);
    }

    #[tokio::test]
    async fn test_per_source_cap() {
        let sources = vec![
            Arc::new(MockSource::with_count("met", 20)) as Arc<dyn ArtSource>,
            Arc::new(MockSource::with_count("aic", 3)) as Arc<dyn ArtSource>,
        ];
        let service = PoolService::with_config(
            sources,
            PoolConfig {
                per_source_cap: 5,
                ..Default::default()
            },
        );

        let pool = service.build(&FeedFilters::default()).await.unwrap();
        let met = pool.ids().iter().filter(|id| id.tag() == "met").count();
        let aic = pool.ids().iter().filter(|id| id.tag() == "aic").count();
        assert_eq!(met, 5);
        assert_eq!(aic, 3);
        assert_eq!(pool.len(), 8);
    }

    #[tokio::test]
    async fn test_single_source_failure_is_absorbed() {
        let service = service(vec![
            MockSource::failing("met"),
            MockSource::with_count("aic", 2),
        ]);

        let pool = service.build(&FeedFilters::default()).await.unwrap();
        assert_eq!(pool.len(), 2);
        assert!(pool.ids().iter().all(|id| id.tag() == "aic"));
    }

    #[tokio::test]
    async fn test_all_sources_failed() {
        let service = service(vec![MockSource::failing("met"), MockSource::failing("aic")]);

        let result = service.build(&FeedFilters::default()).await;
        assert!(matches!(result, Err(AppError::AllSourcesFailed)));
    }

    #[tokio::test]
    async fn test_source_subset_restricts_listing() {
        let met = Arc::new(MockSource::with_count("met", 2));
        let aic = Arc::new(MockSource::with_count("aic", 2));
        let service = PoolService::new(vec![
            Arc::clone(&met) as Arc<dyn ArtSource>,
            Arc::clone(&aic) as Arc<dyn ArtSource>,
        ]);

        let filters = FeedFilters {
            allowed_sources: Some(vec!["aic".to_string()]),
            ..Default::default()
        };
        let pool = service.build(&filters).await.unwrap();

        assert!(pool.ids().iter().all(|id| id.tag() == "aic"));
        assert_eq!(met.list_calls(), 0);
        assert_eq!(aic.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_source_subset_fails_the_build() {
        let service = service(vec![MockSource::with_count("met", 2)]);

        let filters = FeedFilters {
            allowed_sources: Some(vec!["louvre".to_string()]),
            ..Default::default()
        };
        let result = service.build(&filters).await;
        assert!(matches!(result, Err(AppError::AllSourcesFailed)));
    }

    async fn build_seeded(seed: u64) -> IdentifierPool {
        let sources = vec![
            Arc::new(MockSource::with_count("met", 8)) as Arc<dyn ArtSource>,
            Arc::new(MockSource::with_count("aic", 8)) as Arc<dyn ArtSource>,
        ];
        let service = PoolService::with_config(
            sources,
            PoolConfig {
                shuffle_seed: Some(seed),
                ..Default::default()
            },
        );
        service.build(&FeedFilters::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_seeded_build_is_deterministic() {
        let first = build_seeded(7).await;
        let second = build_seeded(7).await;
        assert_eq!(first.ids(), second.ids());
    }

    #[tokio::test]
    async fn test_resolve_dispatches_on_tag() {
        let service = service(vec![
            MockSource::with_count("met", 2),
            MockSource::with_count("aic", 2),
        ]);

        let artwork = service
            .resolve_by_id(&ArtworkId::new("aic", "1"))
            .await
            .unwrap();
        assert_eq!(artwork.id, ArtworkId::new("aic", "1"));
        assert_eq!(artwork.source_name, "Mock aic");
    }

    #[tokio::test]
    async fn test_resolve_unknown_tag() {
        let service = service(vec![MockSource::with_count("met", 2)]);

        let result = service.resolve_by_id(&ArtworkId::new("louvre", "1")).await;
        assert!(matches!(result, Err(AppError::UnknownSource(tag)) if tag == "louvre"));
    }
}
