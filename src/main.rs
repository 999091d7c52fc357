//! WhatsApp Tray - a notification-area companion for WhatsApp Desktop
//!
//! Mirrors WhatsApp's unread-message count in a tray badge and lets the user
//! show or hide the WhatsApp window from the tray.

#![windows_subsystem = "windows"]
#![cfg_attr(not(windows), allow(dead_code))]

#[cfg(windows)]
mod app;
#[cfg(windows)]
mod autostart;
mod config;
mod error;
mod monitor;
mod probe;
mod render;
mod tray;
#[cfg(windows)]
mod utils;

use anyhow::Result;
use log::{info, LevelFilter};

use crate::config::SettingsStore;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .init();

    info!("Starting WhatsApp Tray v{}", env!("CARGO_PKG_VERSION"));

    let settings = SettingsStore::open_default();
    info!("Settings: {:?}", settings.settings());

    run(settings)?;

    info!("WhatsApp Tray shutting down gracefully");
    Ok(())
}

#[cfg(windows)]
fn run(settings: SettingsStore) -> Result<()> {
    let app = app::Application::new(settings)?;
    app.run()
}

#[cfg(not(windows))]
fn run(_settings: SettingsStore) -> Result<()> {
    anyhow::bail!("WhatsApp Tray only runs on Windows")
}
