//! Gallery pagination state.
//!
//! The view-model never performs I/O itself. `refresh` and `load_next_page`
//! hand back a [`PageRequest`] for the caller to run against a
//! [`PhotoSource`], and the outcome is fed back through `complete`.

use crate::error::GalleryError;
use async_trait::async_trait;

pub const DEFAULT_PAGE_SIZE: u32 = 30;
pub const DEFAULT_BASE_URL: &str = "https://api.unsplash.com/";

/// Flattened photo as the UI needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoItem {
    pub id: String,
    pub description: String,
    pub photographer: String,
    pub thumb_url: String,
    pub full_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GalleryUiState {
    Loading,
    Success {
        photos: Vec<PhotoItem>,
        page: u32,
        can_load_more: bool,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub append: bool,
}

#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Vec<PhotoItem>, GalleryError>;
}

pub struct GalleryViewModel {
    state: GalleryUiState,
    is_loading: bool,
    page_size: u32,
}

impl GalleryViewModel {
    pub fn new(page_size: u32) -> Self {
        Self {
            state: GalleryUiState::Loading,
            is_loading: false,
            page_size: page_size.max(1),
        }
    }

    pub fn state(&self) -> &GalleryUiState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Reload from the first page. Ignored while a load is in flight.
    pub fn refresh(&mut self) -> Option<PageRequest> {
        if self.is_loading {
            return None;
        }
        self.state = GalleryUiState::Loading;
        Some(self.begin(1, false))
    }

    pub fn load_next_page(&mut self) -> Option<PageRequest> {
        match self.state {
            GalleryUiState::Success {
                page,
                can_load_more: true,
                ..
            } if !self.is_loading => Some(self.begin(page + 1, true)),
            _ => None,
        }
    }

    fn begin(&mut self, page: u32, append: bool) -> PageRequest {
        self.is_loading = true;
        PageRequest { page, append }
    }

    pub fn complete(
        &mut self,
        request: PageRequest,
        result: Result<Vec<PhotoItem>, GalleryError>,
    ) {
        self.is_loading = false;

        let photos = match result {
            Ok(photos) => photos,
            Err(e) => {
                let message = e.to_string();
                self.state = GalleryUiState::Error {
                    message: if message.is_empty() {
                        "Unknown error".to_string()
                    } else {
                        message
                    },
                };
                return;
            }
        };

        let can_load_more = photos.len() as u32 >= self.page_size;
        let previous = std::mem::replace(&mut self.state, GalleryUiState::Loading);

        let photos = match previous {
            GalleryUiState::Success {
                photos: mut prev, ..
            } if request.append => {
                prev.extend(photos);
                prev
            }
            _ => photos,
        };

        self.state = GalleryUiState::Success {
            photos,
            page: request.page,
            can_load_more,
        };
    }
}

impl Default for GalleryViewModel {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
