use serde::{Deserialize, Serialize};

pub const DEFAULT_USERNAME: &str = "Guest";

/// Login state persisted alongside the rest of the settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    logged_in: bool,
}

impl Session {
    pub fn save_login(&mut self, username: &str) {
        self.username = Some(username.to_string());
        self.logged_in = true;
    }

    pub fn logout(&mut self) {
        *self = Self::default();
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(DEFAULT_USERNAME)
    }
}
