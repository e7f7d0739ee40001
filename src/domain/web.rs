//! The local "about" page and its hello button.

use chrono::{DateTime, Local, TimeZone};

pub const ABOUT_TITLE: &str = "About this app";
pub const ABOUT_BODY: &str = "A small toolkit bundling a Bluetooth LE inspector and an \
Unsplash photo gallery. Press the button below to run the local greeting.";

pub fn hello_message<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "Hello from local JavaScript! It is {}.",
        now.format("%Y-%m-%d %H:%M:%S")
    )
}

/// State of the local page. Pressing hello only replaces the text; the page
/// keeps no history of its own.
#[derive(Debug, Default)]
pub struct WebPage {
    message: Option<String>,
}

impl WebPage {
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn press_hello(&mut self) {
        self.press_hello_at(&Local::now());
    }

    pub fn press_hello_at<Tz: TimeZone>(&mut self, now: &DateTime<Tz>)
    where
        Tz::Offset: std::fmt::Display,
    {
        self.message = Some(hello_message(now));
    }
}
