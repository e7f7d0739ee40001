//! Wire format of `GET /photos`, trimmed to the fields we use.

use crate::domain::gallery::PhotoItem;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashPhoto {
    pub id: String,
    pub description: Option<String>,
    pub alt_description: Option<String>,
    pub urls: UnsplashUrls,
    pub user: UnsplashUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashUrls {
    pub thumb: String,
    pub small: String,
    pub regular: String,
    pub full: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashUser {
    pub name: String,
}

impl From<UnsplashPhoto> for PhotoItem {
    fn from(p: UnsplashPhoto) -> Self {
        PhotoItem {
            id: p.id,
            description: p.description.or(p.alt_description).unwrap_or_default(),
            photographer: p.user.name,
            thumb_url: p.urls.small,
            full_url: p.urls.full,
        }
    }
}
