//! Settings persistence for WhatsApp Tray
//!
//! Preferences live in a small JSON file under the per-user local application
//! data directory. A missing or malformed file yields the defaults; the file is
//! only written when a setting changes.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TrayResult;

/// Directory name under the local application data folder
pub const APP_DIR_NAME: &str = "WhatsAppTrayManager";
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Poll interval used when none (or an invalid one) is stored
pub const DEFAULT_POLL_INTERVAL_SECONDS: i32 = 5;

/// User preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Register in the Windows Run key
    #[serde(alias = "AutoStartEnabled")]
    pub auto_start_enabled: bool,
    /// Hide WhatsApp instead of closing it
    #[serde(alias = "MinimizeToTrayOnClose")]
    pub minimize_to_tray_on_close: bool,
    /// Show balloon notifications
    #[serde(alias = "ShowNotifications")]
    pub show_notifications: bool,
    /// Poll interval in seconds (>= 1)
    #[serde(alias = "PollIntervalSeconds")]
    pub poll_interval_seconds: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_start_enabled: false,
            minimize_to_tray_on_close: true,
            show_notifications: true,
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
        }
    }
}

impl Settings {
    /// Parse settings JSON, repairing an out-of-range poll interval
    pub fn from_json(content: &str) -> TrayResult<Self> {
        let mut settings: Settings = serde_json::from_str(content)?;
        if settings.poll_interval_seconds < 1 {
            settings.poll_interval_seconds = DEFAULT_POLL_INTERVAL_SECONDS;
        }
        Ok(settings)
    }

    /// Serialize settings as indented JSON
    pub fn to_json(&self) -> TrayResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Settings bound to the file they are persisted in
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Get the default settings file path
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
            .join(SETTINGS_FILE_NAME)
    }

    /// Open the store at the default location
    pub fn open_default() -> Self {
        Self::open(Self::default_path())
    }

    /// Open the store at `path`, falling back to defaults if it cannot be read
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = Self::load(&path);
        Self { path, settings }
    }

    fn load(path: &Path) -> Settings {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Settings::default();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read settings, using defaults: {}", e);
                return Settings::default();
            }
        };

        match Settings::from_json(&content) {
            Ok(settings) => {
                info!("Settings loaded from: {:?}", path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse settings, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    /// Write the current settings to disk
    pub fn save(&self) -> TrayResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, self.settings.to_json()?)?;
        info!("Settings saved to: {:?}", self.path);
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!("Failed to save settings: {}", e);
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn auto_start_enabled(&self) -> bool {
        self.settings.auto_start_enabled
    }

    pub fn set_auto_start_enabled(&mut self, enabled: bool) {
        self.settings.auto_start_enabled = enabled;
        self.persist();
    }
}

// Persisted preferences that no menu entry drives yet
#[allow(dead_code)]
impl SettingsStore {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn minimize_to_tray_on_close(&self) -> bool {
        self.settings.minimize_to_tray_on_close
    }

    pub fn set_minimize_to_tray_on_close(&mut self, enabled: bool) {
        self.settings.minimize_to_tray_on_close = enabled;
        self.persist();
    }

    pub fn show_notifications(&self) -> bool {
        self.settings.show_notifications
    }

    pub fn set_show_notifications(&mut self, enabled: bool) {
        self.settings.show_notifications = enabled;
        self.persist();
    }

    pub fn poll_interval_seconds(&self) -> i32 {
        self.settings.poll_interval_seconds
    }

    /// Set the poll interval, clamped to at least one second
    pub fn set_poll_interval_seconds(&mut self, seconds: i32) {
        self.settings.poll_interval_seconds = seconds.max(1);
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_schema() {
        let s = Settings::default();
        assert!(!s.auto_start_enabled);
        assert!(s.minimize_to_tray_on_close);
        assert!(s.show_notifications);
        assert_eq!(s.poll_interval_seconds, 5);
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let json = Settings::default().to_json().expect("serialize");
        assert!(json.contains("\"autoStartEnabled\""));
        assert!(json.contains("\"minimizeToTrayOnClose\""));
        assert!(json.contains("\"showNotifications\""));
        assert!(json.contains("\"pollIntervalSeconds\""));
    }

    #[test]
    fn pascal_case_files_still_load() {
        let s = Settings::from_json(r#"{"AutoStartEnabled": true, "PollIntervalSeconds": 9}"#)
            .expect("parse");
        assert!(s.auto_start_enabled);
        assert_eq!(s.poll_interval_seconds, 9);
        // Missing keys take the defaults
        assert!(s.show_notifications);
    }

    #[test]
    fn invalid_interval_is_repaired_on_load() {
        let s = Settings::from_json(r#"{"pollIntervalSeconds": 0}"#).expect("parse");
        assert_eq!(s.poll_interval_seconds, DEFAULT_POLL_INTERVAL_SECONDS);
    }

    #[test]
    fn missing_file_yields_defaults_without_writing() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(APP_DIR_NAME).join("settings.json");
        let store = SettingsStore::open(&path);
        assert_eq!(store.settings(), &Settings::default());
        assert!(!path.exists());
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").expect("write");
        let store = SettingsStore::open(&path);
        assert_eq!(store.settings(), &Settings::default());
    }

    #[test]
    fn setters_persist_immediately() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(APP_DIR_NAME).join("settings.json");

        let mut store = SettingsStore::open(&path);
        store.set_auto_start_enabled(true);
        store.set_show_notifications(false);
        store.set_poll_interval_seconds(-4);
        assert_eq!(store.poll_interval_seconds(), 1);

        let reopened = SettingsStore::open(&path);
        assert!(reopened.auto_start_enabled());
        assert!(!reopened.show_notifications());
        assert!(reopened.minimize_to_tray_on_close());
        assert_eq!(reopened.poll_interval_seconds(), 1);
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        let p = SettingsStore::default_path();
        let s = p.to_string_lossy();
        assert!(
            s.ends_with("WhatsAppTrayManager/settings.json")
                || s.ends_with("WhatsAppTrayManager\\settings.json"),
            "unexpected settings path: {}",
            s
        );
    }
}
