// src/sources/mod.rs
//
// The consumed museum-catalog contract. Each external source implements this
// trait; the pipeline never sees museum-specific parsing or licensing logic.
//
// CRITICAL RULES:
// - A returned Artwork is assumed complete; sources communicate failure,
//   not partial records
// - Rights/licensing detection lives entirely inside the source; the
//   pipeline only sees RightsRejected
// - Results are idempotent in content for a given identifier

use async_trait::async_trait;

use crate::domain::{Artwork, ArtworkId, FeedFilters};
use crate::error::AppResult;

#[cfg(test)]
pub mod mock;

#[async_trait]
pub trait ArtSource: Send + Sync {
    /// Short lowercase source code used as the identifier tag prefix
    /// (e.g. "met", "aic", "cma", "getty", "rijks", "yale").
    fn tag(&self) -> &str;

    /// Human-readable catalog name for display.
    fn name(&self) -> &str;

    /// List candidate identifiers matching the filters. May legitimately
    /// return fewer than the caller hoped for, or fail entirely.
    async fn list_identifiers(&self, filters: &FeedFilters) -> AppResult<Vec<ArtworkId>>;

    /// Resolve one identifier to a complete record. Fails with
    /// `RightsRejected`, `NotFound`, `Malformed` or `SourceUnavailable`.
    async fn resolve(&self, id: &ArtworkId) -> AppResult<Artwork>;
}
