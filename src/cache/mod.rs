// src/cache/mod.rs

pub mod image_cache;

pub use image_cache::{CachedImage, ImageCache, ImageFetcher, IMAGE_CACHE_CAPACITY};
