// src/lib.rs
// Artfeed - swipeable feed of public-domain artwork over independent
// museum catalogs
//
// Architecture:
// - Sources behind a trait: museum-specific parsing and licensing stays out
// - Absorb-and-log: individual source failures never surface unless every
//   avenue is exhausted
// - Session-scoped: all state is memory-resident and cleared on filter change
// - Explicit wiring: services are constructed and injected, no singletons

pub mod application;
pub mod cache;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod services;
pub mod sources;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{Artwork, ArtworkId, FeedFilters, PeriodPreset};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Pipeline
// ============================================================================

pub use application::AppState;
pub use cache::{CachedImage, ImageCache, ImageFetcher};
pub use services::{
    FeedConfig,
    FeedService,
    HistoryState,
    IdentifierPool,
    PoolConfig,
    PoolService,
    SamplerConfig,
    SamplerService,
};
pub use sources::ArtSource;
