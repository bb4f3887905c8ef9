// src/services/feed_service.rs
//
// Prefetch Controller - the app-facing feed API.
//
// CRITICAL RULES:
// - Swipes (next/previous) are mutually exclusive with each other via the
//   advancing flag, but not with the background buffer filler
// - The buffer filler is single-flight: re-triggering while it runs is a
//   no-op
// - A filter change fully clears pool, used-set, history, buffer and image
//   cache before the next build; a generation counter invalidates filler
//   results that finish after the reset
// - Forward-history replay never re-resolves
// - Background prefetch failures are silent; the next swipe falls back to
//   synchronous resolution

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::Mutex;

use crate::cache::ImageCache;
use crate::domain::{Artwork, ArtworkId, FeedFilters};
use crate::error::{AppError, AppResult};
use crate::services::history::{HistoryState, HISTORY_CAP};
use crate::services::pool_service::PoolService;
use crate::services::sampler::{SamplerService, SamplerState};

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Look-ahead records kept resolved and ready.
    pub buffer_target: usize,
    pub history_cap: usize,
    /// Delay before the single automatic retry of a failed initial load.
    pub retry_delay: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            buffer_target: 3,
            history_cap: HISTORY_CAP,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Navigation state owned by the controller. The buffer is disjoint from
/// history and from identifiers already attempted; `next_slot` is a resolved
/// record staged for the next forward swipe when no forward history exists.
struct FeedState {
    history: HistoryState,
    buffer: VecDeque<Artwork>,
    next_slot: Option<Artwork>,
    filters: FeedFilters,
}

pub struct FeedService {
    pool_service: Arc<PoolService>,
    sampler: Arc<SamplerService>,
    cache: Arc<ImageCache>,
    config: FeedConfig,
    sampler_state: Arc<StdMutex<SamplerState>>,
    feed: Mutex<FeedState>,
    /// Rejects concurrent swipes.
    advancing: AtomicBool,
    /// Single-flight guard for the buffer filler.
    filling: AtomicBool,
    /// Bumped on every session reset; stale filler results are discarded.
    generation: AtomicU64,
}

impl FeedService {
    pub fn new(
        pool_service: Arc<PoolService>,
        sampler: Arc<SamplerService>,
        cache: Arc<ImageCache>,
    ) -> Self {
        Self::with_config(pool_service, sampler, cache, FeedConfig::default())
    }

    pub fn with_config(
        pool_service: Arc<PoolService>,
        sampler: Arc<SamplerService>,
        cache: Arc<ImageCache>,
        config: FeedConfig,
    ) -> Self {
        let history_cap = config.history_cap;
        Self {
            pool_service,
            sampler,
            cache,
            config,
            sampler_state: Arc::new(StdMutex::new(SamplerState::default())),
            feed: Mutex::new(FeedState {
                history: HistoryState::new(history_cap),
                buffer: VecDeque::new(),
                next_slot: None,
                filters: FeedFilters::default(),
            }),
            advancing: AtomicBool::new(false),
            filling: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Begin a session: build the pool and resolve the first artwork.
    ///
    /// On failure the whole load is retried once after a fixed delay before
    /// the error surfaces.
    pub async fn start(self: &Arc<Self>, filters: FeedFilters) -> AppResult<Artwork> {
        match self.initial_load(&filters).await {
            Ok(artwork) => Ok(artwork),
            Err(e) => {
                warn!("initial load failed, retrying once: {}", e);
                tokio::time::sleep(self.config.retry_delay).await;
                self.initial_load(&filters).await
            }
        }
    }

    /// Change the filter configuration. Clears everything and rebuilds.
    pub async fn set_filters(self: &Arc<Self>, filters: FeedFilters) -> AppResult<Artwork> {
        self.start(filters).await
    }

    /// The record under the history cursor.
    pub async fn current(&self) -> Option<Artwork> {
        self.feed.lock().await.history.current().cloned()
    }

    /// Advance the feed: forward-history replay if available, otherwise the
    /// staged slot, the prefetch buffer, or a synchronous resolution.
    pub async fn next(self: &Arc<Self>) -> AppResult<Artwork> {
        if self.advancing.swap(true, Ordering::SeqCst) {
            return Err(AppError::Busy);
        }
        let result = self.advance().await;
        self.advancing.store(false, Ordering::SeqCst);
        result
    }

    /// Step back to the previous record.
    pub async fn previous(self: &Arc<Self>) -> AppResult<Artwork> {
        if self.advancing.swap(true, Ordering::SeqCst) {
            return Err(AppError::Busy);
        }
        let result = self.step_back().await;
        self.advancing.store(false, Ordering::SeqCst);
        result
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    async fn initial_load(self: &Arc<Self>, filters: &FeedFilters) -> AppResult<Artwork> {
        self.reset_session(filters.clone()).await;

        let pool = self.pool_service.build(filters).await?;
        self.sampler_state.lock().unwrap().rebuild(pool);

        let artwork = self
            .sampler
            .pick_next(&self.sampler_state, &HashSet::new(), None)
            .await?;

        {
            let mut feed = self.feed.lock().await;
            feed.history.push(artwork.clone());
            self.prime_neighbors(&mut feed).await;
        }
        self.trigger_fill();

        Ok(artwork)
    }

    /// Clear pool, used-set, history, buffer, staged slots and the image
    /// cache. Runs fully before the next build starts.
    async fn reset_session(&self, filters: FeedFilters) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        {
            let mut feed = self.feed.lock().await;
            feed.history.reset();
            feed.buffer.clear();
            feed.next_slot = None;
            feed.filters = filters;
        }
        self.sampler_state.lock().unwrap().clear();
        self.cache.clear().await;
    }

    async fn advance(self: &Arc<Self>) -> AppResult<Artwork> {
        let mut feed = self.feed.lock().await;

        // Replay path: deterministic, never re-fetches.
        if let Some(artwork) = feed.history.step_forward().cloned() {
            self.prime_neighbors(&mut feed).await;
            drop(feed);
            self.trigger_fill();
            return Ok(artwork);
        }

        let staged = match feed.next_slot.take() {
            Some(artwork) => Some(artwork),
            None => feed.buffer.pop_front(),
        };
        let artwork = match staged {
            Some(artwork) => artwork,
            None => {
                // Last resort: resolve synchronously while holding the state.
                let avoid = Self::avoid_ids(&feed);
                let avoid_url = feed.history.current().map(|a| a.image_url.clone());
                self.sampler
                    .pick_next(&self.sampler_state, &avoid, avoid_url.as_deref())
                    .await?
            }
        };

        feed.history.push(artwork.clone());
        self.prime_neighbors(&mut feed).await;
        drop(feed);
        self.trigger_fill();

        Ok(artwork)
    }

    async fn step_back(self: &Arc<Self>) -> AppResult<Artwork> {
        let mut feed = self.feed.lock().await;
        let artwork = feed
            .history
            .step_backward()
            .cloned()
            .ok_or(AppError::NoHistory)?;
        self.prime_neighbors(&mut feed).await;
        drop(feed);
        self.trigger_fill();
        Ok(artwork)
    }

    /// Stage the "next" record and warm the cache for the immediate
    /// neighbors. Failures leave the slot unset; the next swipe falls back
    /// to synchronous resolution.
    async fn prime_neighbors(&self, feed: &mut FeedState) {
        let mut urls = Vec::new();

        if let Some(prev) = feed.history.peek_prev() {
            urls.push(prev.image_url.clone());
        }

        if let Some(next) = feed.history.peek_next() {
            // Forward history wins; the staged slot stays for later.
            urls.push(next.image_url.clone());
        } else {
            if feed.next_slot.is_none() {
                if let Some(artwork) = feed.buffer.pop_front() {
                    feed.next_slot = Some(artwork);
                } else {
                    let avoid = Self::avoid_ids(feed);
                    let avoid_url = feed.history.current().map(|a| a.image_url.clone());
                    match self
                        .sampler
                        .pick_next(&self.sampler_state, &avoid, avoid_url.as_deref())
                        .await
                    {
                        Ok(artwork) => feed.next_slot = Some(artwork),
                        Err(e) => debug!("prime: could not stage next record: {}", e),
                    }
                }
            }
            if let Some(slot) = &feed.next_slot {
                urls.push(slot.image_url.clone());
            }
        }

        if !urls.is_empty() {
            self.cache.prefetch(&urls).await;
        }
    }

    /// Spawn the buffer filler unless one is already running.
    fn trigger_fill(self: &Arc<Self>) {
        if self.filling.swap(true, Ordering::SeqCst) {
            return;
        }
        let service = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let generation = service.generation.load(Ordering::SeqCst);
                service.fill_buffer(generation).await;
                // A reset during the fill started a new session whose
                // trigger was a no-op against this task; run again for it.
                if service.generation.load(Ordering::SeqCst) == generation {
                    break;
                }
            }
            service.filling.store(false, Ordering::SeqCst);
        });
    }

    /// Pull fresh records into the buffer until it reaches its target size,
    /// stopping early when the pool is exhausted. All failures are silent.
    async fn fill_buffer(&self, generation: u64) {
        loop {
            if self.generation.load(Ordering::SeqCst) != generation {
                return;
            }

            let (avoid, avoid_url) = {
                let feed = self.feed.lock().await;
                if feed.buffer.len() >= self.config.buffer_target {
                    return;
                }
                (
                    Self::avoid_ids(&feed),
                    feed.history.current().map(|a| a.image_url.clone()),
                )
            };

            match self
                .sampler
                .pick_next(&self.sampler_state, &avoid, avoid_url.as_deref())
                .await
            {
                Ok(artwork) => {
                    let url = artwork.image_url.clone();
                    {
                        let mut feed = self.feed.lock().await;
                        if self.generation.load(Ordering::SeqCst) != generation {
                            // A filter change won; discard the stale record.
                            return;
                        }
                        feed.buffer.push_back(artwork);
                    }
                    self.cache.prefetch(&[url.clone()]).await;
                }
                Err(AppError::PoolExhausted) => {
                    debug!("buffer fill: pool exhausted, stopping early");
                    return;
                }
                Err(e) => {
                    warn!("buffer fill: {}", e);
                    return;
                }
            }
        }
    }

    /// Identifiers the filler and the fallback sampler must not produce:
    /// everything in history, the buffer, and the staged slot.
    fn avoid_ids(feed: &FeedState) -> HashSet<ArtworkId> {
        let mut avoid: HashSet<ArtworkId> = feed
            .history
            .records()
            .iter()
            .map(|a| a.id.clone())
            .collect();
        avoid.extend(feed.buffer.iter().map(|a| a.id.clone()));
        if let Some(slot) = &feed.next_slot {
            avoid.insert(slot.id.clone());
        }
        avoid
    }

    #[cfg(test)]
    pub(crate) async fn buffer_len(&self) -> usize {
        self.feed.lock().await.buffer.len()
    }

    #[cfg(test)]
    pub(crate) async fn history_len(&self) -> usize {
        self.feed.lock().await.history.len()
    }
}
