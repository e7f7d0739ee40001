pub mod bluetooth;
pub mod gallery;
pub mod home;
pub mod network;
pub mod settings;
pub mod web;
