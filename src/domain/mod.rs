// src/domain/mod.rs

pub mod artwork;
pub mod filters;

pub use artwork::{Artwork, ArtworkId};
pub use filters::{FeedFilters, PeriodPreset};
