//! System tray surface and its context menu

#[cfg(windows)]
pub mod win32;

use std::sync::Arc;

use crate::error::TrayResult;

#[cfg(windows)]
pub use win32::TrayIcon;

/// The notification-area icon the monitor pushes state to
pub trait TraySurface: Send + Sync {
    type Icon;

    /// Replace the displayed icon; the surface keeps `icon` alive while shown
    fn set_icon(&self, icon: Arc<Self::Icon>) -> TrayResult<()>;

    /// Replace the hover text
    fn set_tooltip(&self, text: &str) -> TrayResult<()>;
}

/// Commands reachable from the tray context menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    OpenWhatsApp,
    ToggleAutoStart,
    Exit,
}

impl TrayCommand {
    pub fn id(self) -> u32 {
        match self {
            TrayCommand::OpenWhatsApp => 1,
            TrayCommand::ToggleAutoStart => 2,
            TrayCommand::Exit => 100,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(TrayCommand::OpenWhatsApp),
            2 => Some(TrayCommand::ToggleAutoStart),
            100 => Some(TrayCommand::Exit),
            _ => None,
        }
    }
}

/// Tray menu item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayMenuItem {
    Command {
        command: TrayCommand,
        label: String,
        is_checked: bool,
    },
    Separator,
}

/// Tray context menu
pub struct TrayMenu {
    items: Vec<TrayMenuItem>,
}

impl TrayMenu {
    /// Build the menu, checking "Start with Windows" when auto-start is on
    pub fn new(auto_start_enabled: bool) -> Self {
        let item = |command, label: &str, is_checked| TrayMenuItem::Command {
            command,
            label: label.to_string(),
            is_checked,
        };

        Self {
            items: vec![
                item(TrayCommand::OpenWhatsApp, "Open WhatsApp", false),
                TrayMenuItem::Separator,
                item(TrayCommand::ToggleAutoStart, "Start with Windows", auto_start_enabled),
                TrayMenuItem::Separator,
                item(TrayCommand::Exit, "Exit", false),
            ],
        }
    }

    pub fn items(&self) -> &[TrayMenuItem] {
        &self.items
    }
}
