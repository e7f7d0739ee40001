use crate::domain::gallery::{PhotoItem, PhotoSource};
use crate::error::GalleryError;
use crate::infrastructure::unsplash::api::UnsplashApi;
use crate::infrastructure::unsplash::models::UnsplashPhoto;
use async_trait::async_trait;
use tracing::warn;

/// Pages of [`PhotoItem`]s from Unsplash.
pub struct UnsplashRepository {
    api: UnsplashApi,
}

impl UnsplashRepository {
    pub fn new(api: UnsplashApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PhotoSource for UnsplashRepository {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Vec<PhotoItem>, GalleryError> {
        let response = self.api.list_photos(page, page_size).await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Photo listing failed with {}", status);
            return Err(GalleryError::Http(status.as_u16()));
        }

        // A `null` body counts as an empty page
        let body: Option<Vec<UnsplashPhoto>> = response.json().await?;
        Ok(body
            .unwrap_or_default()
            .into_iter()
            .map(PhotoItem::from)
            .collect())
    }
}
