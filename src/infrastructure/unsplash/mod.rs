//! Unsplash photo listing: HTTP client, wire models, repository and the
//! background worker that drives the gallery view-model.

pub mod api;
pub mod models;
pub mod repository;
pub mod worker;

pub use repository::UnsplashRepository;
