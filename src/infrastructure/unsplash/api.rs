use crate::error::GalleryError;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, Url};
use std::time::Instant;
use tracing::info;

/// Thin client for the Unsplash REST API.
pub struct UnsplashApi {
    client: Client,
    base_url: Url,
    access_key: String,
}

impl UnsplashApi {
    pub fn new(base_url: &str, access_key: impl Into<String>) -> Result<Self, GalleryError> {
        // `Url::join` drops the last path segment unless the base ends in '/'
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|_| GalleryError::InvalidBaseUrl(base))?;

        Ok(Self {
            client: Client::new(),
            base_url,
            access_key: access_key.into(),
        })
    }

    pub fn photos_url(&self, page: u32, per_page: u32) -> Result<Url, GalleryError> {
        let mut url = self
            .base_url
            .join("photos")
            .map_err(|_| GalleryError::InvalidBaseUrl(self.base_url.to_string()))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());
        Ok(url)
    }

    /// `GET photos`. The status is left for the caller to judge.
    pub async fn list_photos(&self, page: u32, per_page: u32) -> Result<Response, GalleryError> {
        if self.access_key.is_empty() {
            return Err(GalleryError::MissingAccessKey);
        }
        let url = self.photos_url(page, per_page)?;

        info!("--> GET {}", url);
        let started = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, format!("Client-ID {}", self.access_key))
            .send()
            .await?;
        info!(
            "<-- {} {} ({}ms)",
            response.status().as_u16(),
            url,
            started.elapsed().as_millis()
        );

        Ok(response)
    }
}
