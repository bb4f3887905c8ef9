// src/infrastructure/http_fetcher.rs
//
// HTTP implementation of the ImageFetcher seam: GET the payload, decode it.
// Transport problems and undecodable payloads are reported as distinct
// failures so callers can tell them apart.

use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;

use crate::cache::ImageFetcher;
use crate::error::{AppError, AppResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> AppResult<DynamicImage> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::SourceUnavailable(format!(
                "image server returned status {} for {}",
                response.status(),
                url
            )));
        }

        let bytes = response.bytes().await?;
        image::load_from_memory(&bytes).map_err(|e| AppError::ImageDecode(e.to_string()))
    }
}
