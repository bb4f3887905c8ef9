// src/sources/mock.rs
//
// Scripted in-memory sources for pipeline tests. Behavior is configured up
// front: which identifiers exist, which ones fail resolution and how, and
// whether listing itself fails.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Artwork, ArtworkId, FeedFilters};
use crate::error::{AppError, AppResult};
use crate::sources::ArtSource;

pub struct MockSource {
    tag: String,
    name: String,
    ids: Vec<ArtworkId>,
    list_fails: bool,
    rights_rejected: HashSet<ArtworkId>,
    unavailable: HashSet<ArtworkId>,
    /// Overrides the derived image url for specific ids (duplicate-image tests).
    image_overrides: HashMap<ArtworkId, String>,
    /// Artificial latency per resolve, for in-flight interleaving tests.
    resolve_delay: Duration,
    list_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
}

impl MockSource {
    pub fn new(tag: &str, local_ids: &[&str]) -> Self {
        let ids = local_ids
            .iter()
            .map(|local| ArtworkId::new(tag, local))
            .collect();
        Self {
            tag: tag.to_string(),
            name: format!("Mock {}", tag),
            ids,
            list_fails: false,
            rights_rejected: HashSet::new(),
            unavailable: HashSet::new(),
            image_overrides: HashMap::new(),
            resolve_delay: Duration::ZERO,
            list_calls: AtomicUsize::new(0),
            resolve_calls: AtomicUsize::new(0),
        }
    }

    /// Source whose identifiers are `tag:0 .. tag:count-1`.
    pub fn with_count(tag: &str, count: usize) -> Self {
        let locals: Vec<String> = (0..count).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = locals.iter().map(|s| s.as_str()).collect();
        Self::new(tag, &refs)
    }

    pub fn failing(tag: &str) -> Self {
        let mut source = Self::new(tag, &[]);
        source.list_fails = true;
        source
    }

    pub fn reject_rights(mut self, local_id: &str) -> Self {
        self.rights_rejected.insert(ArtworkId::new(&self.tag, local_id));
        self
    }

    pub fn unavailable(mut self, local_id: &str) -> Self {
        self.unavailable.insert(ArtworkId::new(&self.tag, local_id));
        self
    }

    pub fn image_url_for(mut self, local_id: &str, url: &str) -> Self {
        self.image_overrides
            .insert(ArtworkId::new(&self.tag, local_id), url.to_string());
        self
    }

    pub fn with_resolve_delay(mut self, delay: Duration) -> Self {
        self.resolve_delay = delay;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtSource for MockSource {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn list_identifiers(&self, _filters: &FeedFilters) -> AppResult<Vec<ArtworkId>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.list_fails {
            return Err(AppError::SourceUnavailable(format!(
                "{}: scripted listing failure",
                self.tag
            )));
        }
        Ok(self.ids.clone())
    }

    async fn resolve(&self, id: &ArtworkId) -> AppResult<Artwork> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if !self.resolve_delay.is_zero() {
            tokio::time::sleep(self.resolve_delay).await;
        }

        if self.rights_rejected.contains(id) {
            return Err(AppError::RightsRejected);
        }
        if self.unavailable.contains(id) {
            return Err(AppError::SourceUnavailable(format!(
                "{}: scripted resolve failure",
                self.tag
            )));
        }
        if !self.ids.contains(id) {
            return Err(AppError::NotFound);
        }

        let image_url = self
            .image_overrides
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("https://images.test/{}/{}.jpg", self.tag, id.local_id()));

        Ok(Artwork::new(
            id.clone(),
            format!("Artwork {}", id.local_id()),
            "Mock Artist".to_string(),
            image_url,
            self.name.clone(),
        ))
    }
}
