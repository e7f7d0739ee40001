//! Error types at the service seams.
//!
//! Application edges (settings I/O, logger setup) use `anyhow`; these enums
//! cover the failures a screen needs to tell apart.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BleError {
    #[error("Bluetooth adapter not available")]
    AdapterUnavailable,

    #[error("Missing permission for {0}")]
    MissingPermission(&'static str),

    #[error("Device {0} is no longer known to the adapter")]
    UnknownDevice(String),

    #[error("No readable characteristic found")]
    NoCharacteristic,

    #[error(transparent)]
    Platform(#[from] btleplug::Error),
}

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("HTTP {0}")]
    Http(u16),

    #[error("Unsplash access key is not configured")]
    MissingAccessKey,

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Http(u16),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}
