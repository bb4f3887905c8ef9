// src/application/state.rs

use std::sync::Arc;

use crate::cache::ImageCache;
use crate::infrastructure::HttpImageFetcher;
use crate::services::{FeedService, PoolService, SamplerService};
use crate::sources::ArtSource;

/// The wired pipeline handed to the UI layer.
///
/// Every service is constructed explicitly and injected here - there are no
/// shared singletons. A filter change goes through `FeedService::set_filters`,
/// which resets the whole session state.
pub struct AppState {
    pub pool_service: Arc<PoolService>,
    pub sampler: Arc<SamplerService>,
    pub image_cache: Arc<ImageCache>,
    pub feed_service: Arc<FeedService>,
}

impl AppState {
    pub fn new(sources: Vec<Arc<dyn ArtSource>>) -> Self {
        let pool_service = Arc::new(PoolService::new(sources));
        let sampler = Arc::new(SamplerService::new(Arc::clone(&pool_service)));
        let image_cache = Arc::new(ImageCache::new(Arc::new(HttpImageFetcher::new())));
        let feed_service = Arc::new(FeedService::new(
            Arc::clone(&pool_service),
            Arc::clone(&sampler),
            Arc::clone(&image_cache),
        ));

        Self {
            pool_service,
            sampler,
            image_cache,
            feed_service,
        }
    }
}
