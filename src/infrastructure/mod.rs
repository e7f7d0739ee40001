pub mod bluetooth;
pub mod logging;
pub mod text_fetch;
pub mod unsplash;
