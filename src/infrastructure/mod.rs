// src/infrastructure/mod.rs

pub mod http_fetcher;

pub use http_fetcher::HttpImageFetcher;
