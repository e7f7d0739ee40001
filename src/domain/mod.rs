pub mod ble_format;
pub mod gallery;
pub mod models;
pub mod permissions;
pub mod session;
pub mod settings;
pub mod web;
