//! Custom error types for the WhatsApp Tray application

use thiserror::Error;

/// Main error type for WhatsApp Tray operations
#[derive(Error, Debug)]
pub enum TrayError {
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApi(#[from] windows::core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Icon render error: {0}")]
    IconRender(String),

    #[error("Tray icon error: {0}")]
    TrayIcon(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Launch error: {0}")]
    Launch(String),
}

/// Result type alias for WhatsApp Tray operations
pub type TrayResult<T> = Result<T, TrayError>;
