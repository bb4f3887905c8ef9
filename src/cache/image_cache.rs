// src/cache/image_cache.rs
//
// URL -> decoded-image store with bounded size, LRU eviction and in-flight
// request coalescing.
//
// CRITICAL RULES:
// - All cache state (map, access order, in-flight table) lives behind one
//   mutex; concurrent callers never observe a torn read/write
// - A miss starts exactly one fetch per url; concurrent callers for the
//   same url await that fetch instead of issuing a duplicate request
// - Access order is refreshed on every get/load hit; inserts evict the
//   least-recently-accessed entries until under capacity
// - clear() drops entries and abandons in-flight operations; pending
//   waiters observe a miss

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use log::{debug, warn};
use tokio::sync::{broadcast, Mutex};

use crate::error::AppResult;

pub const IMAGE_CACHE_CAPACITY: usize = 20;

pub type CachedImage = Arc<DynamicImage>;

/// Fetches and decodes one image payload. Implemented over HTTP in
/// infrastructure; tests substitute scripted fetchers.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> AppResult<DynamicImage>;
}

struct CacheState {
    entries: HashMap<String, CachedImage>,
    /// Access order, least-recently-used first.
    access_order: Vec<String>,
    in_flight: HashMap<String, broadcast::Sender<Option<CachedImage>>>,
    /// Bumped by clear(); a fetch that finishes under an older generation
    /// discards its result.
    generation: u64,
}

impl CacheState {
    fn touch(&mut self, url: &str) {
        if let Some(pos) = self.access_order.iter().position(|u| u == url) {
            let entry = self.access_order.remove(pos);
            self.access_order.push(entry);
        }
    }

    fn insert(&mut self, url: &str, image: CachedImage, capacity: usize) {
        self.entries.insert(url.to_string(), image);
        self.access_order.retain(|u| u != url);
        self.access_order.push(url.to_string());

        while self.entries.len() > capacity {
            let oldest = self.access_order.remove(0);
            self.entries.remove(&oldest);
            debug!("image cache: evicted {}", oldest);
        }
    }
}

enum LoadPath {
    Hit(CachedImage),
    Follower(broadcast::Receiver<Option<CachedImage>>),
    Leader {
        tx: broadcast::Sender<Option<CachedImage>>,
        generation: u64,
    },
}

pub struct ImageCache {
    fetcher: Arc<dyn ImageFetcher>,
    capacity: usize,
    state: Mutex<CacheState>,
}

impl ImageCache {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self::with_capacity(fetcher, IMAGE_CACHE_CAPACITY)
    }

    pub fn with_capacity(fetcher: Arc<dyn ImageFetcher>, capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        Self {
            fetcher,
            capacity,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                access_order: Vec::new(),
                in_flight: HashMap::new(),
                generation: 0,
            }),
        }
    }

    /// Cache-only lookup, no network. A hit refreshes the access order.
    pub async fn get(&self, url: &str) -> Option<CachedImage> {
        let mut state = self.state.lock().await;
        let hit = state.entries.get(url).cloned();
        if hit.is_some() {
            state.touch(url);
        }
        hit
    }

    /// Cached-or-fetched lookup. Concurrent callers for the same uncached
    /// url share a single underlying fetch. Fetch failures are absorbed and
    /// reported as a miss.
    pub async fn load(&self, url: &str) -> Option<CachedImage> {
        let path = {
            let mut state = self.state.lock().await;
            if let Some(image) = state.entries.get(url).cloned() {
                state.touch(url);
                LoadPath::Hit(image)
            } else if let Some(tx) = state.in_flight.get(url) {
                LoadPath::Follower(tx.subscribe())
            } else {
                let (tx, _) = broadcast::channel(1);
                state.in_flight.insert(url.to_string(), tx.clone());
                LoadPath::Leader {
                    tx,
                    generation: state.generation,
                }
            }
        };

        match path {
            LoadPath::Hit(image) => Some(image),
            LoadPath::Follower(mut rx) => {
                // A dropped sender (clear during flight) reads as a miss.
                rx.recv().await.ok().flatten()
            }
            LoadPath::Leader { tx, generation } => {
                let fetched = match self.fetcher.fetch(url).await {
                    Ok(image) => Some(Arc::new(image)),
                    Err(e) => {
                        warn!("image cache: fetch failed for {}: {}", url, e);
                        None
                    }
                };

                let mut state = self.state.lock().await;
                if state.generation != generation {
                    // The cache was cleared while fetching; abandon the result.
                    let _ = tx.send(None);
                    return None;
                }

                if let Some(image) = &fetched {
                    state.insert(url, Arc::clone(image), self.capacity);
                }
                state.in_flight.remove(url);
                // Notify while holding the lock: late callers either find the
                // in-flight entry before removal or the cache entry after it.
                let _ = tx.send(fetched.clone());
                fetched
            }
        }
    }

    /// Fire background loads for urls that are neither cached nor already
    /// in flight. Results populate the cache as a side effect; failures are
    /// silent.
    pub async fn prefetch(self: &Arc<Self>, urls: &[String]) {
        let missing: Vec<String> = {
            let state = self.state.lock().await;
            urls.iter()
                .filter(|u| !state.entries.contains_key(*u) && !state.in_flight.contains_key(*u))
                .cloned()
                .collect()
        };

        for url in missing {
            let cache = Arc::clone(self);
            tokio::spawn(async move {
                let _ = cache.load(&url).await;
            });
        }
    }

    /// Drop all entries and abandon in-flight operations. Used on filter
    /// change.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.access_order.clear();
        // In-flight leaders notice the generation bump on completion and
        // resolve their waiters with a miss.
        state.in_flight = HashMap::new();
        state.generation += 1;
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.state.lock().await.entries.contains_key(url)
    }
}
