use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UiLanguage {
    #[default]
    Fr,
    En,
}

/// Dashboard settings, one field per recognised setting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Whether companies can find the profile in search.
    pub profile_visibility: bool,
    pub email_notifications: bool,
    pub language: UiLanguage,
    /// Alerts for new job offers matching the search preferences.
    pub job_offers: bool,
    /// Alerts when a company wants to get in touch.
    pub relationships: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile_visibility: true,
            email_notifications: true,
            language: UiLanguage::Fr,
            job_offers: true,
            relationships: true,
        }
    }
}

// Sent by the client's settings tab.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "setting", content = "value", rename_all = "snake_case")]
pub enum SettingChange {
    ProfileVisibility(bool),
    EmailNotifications(bool),
    Language(UiLanguage),
    JobOffers(bool),
    Relationships(bool),
}

impl Settings {
    #[allow(dead_code)]
    pub fn apply(&mut self, change: SettingChange) {
        match change {
            SettingChange::ProfileVisibility(v) => self.profile_visibility = v,
            SettingChange::EmailNotifications(v) => self.email_notifications = v,
            SettingChange::Language(v) => self.language = v,
            SettingChange::JobOffers(v) => self.job_offers = v,
            SettingChange::Relationships(v) => self.relationships = v,
        }
    }
}
