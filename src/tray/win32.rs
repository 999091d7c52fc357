//! Shell notification icon and popup menu

use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, POINT};
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NIM_MODIFY,
    NOTIFYICONDATAW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreatePopupMenu, DestroyMenu, GetCursorPos, InsertMenuW, SetForegroundWindow, TrackPopupMenu,
    MF_CHECKED, MF_SEPARATOR, MF_STRING, TPM_RETURNCMD, TPM_RIGHTBUTTON,
};

use super::{TrayCommand, TrayMenu, TrayMenuItem, TraySurface};
use crate::error::{TrayError, TrayResult};
use crate::render::NativeIcon;
use crate::utils::to_wide_string;

/// Tray icon identifier
const TRAY_ICON_ID: u32 = 1;

struct TrayState {
    is_added: bool,
    // Keeps the displayed icon alive; the cache owns it otherwise
    icon: Arc<NativeIcon>,
}

/// System tray icon owned by the hidden application window
pub struct TrayIcon {
    // Stored as isize for Send + Sync
    hwnd: isize,
    callback_message: u32,
    state: Mutex<TrayState>,
}

impl TrayIcon {
    /// Create and add a tray icon that reports events to `hwnd`
    pub fn new(hwnd: HWND, callback_message: u32, icon: Arc<NativeIcon>, tooltip: &str) -> TrayResult<Self> {
        let tray = Self {
            hwnd: hwnd.0 as isize,
            callback_message,
            state: Mutex::new(TrayState { is_added: false, icon }),
        };

        tray.add(tooltip)?;
        Ok(tray)
    }

    fn hwnd(&self) -> HWND {
        HWND(self.hwnd as *mut std::ffi::c_void)
    }

    fn notify_data(&self) -> NOTIFYICONDATAW {
        NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: self.hwnd(),
            uID: TRAY_ICON_ID,
            ..Default::default()
        }
    }

    fn add(&self, tooltip: &str) -> TrayResult<()> {
        let mut state = self.state.lock();

        let mut nid = self.notify_data();
        nid.uFlags = NIF_ICON | NIF_MESSAGE | NIF_TIP;
        nid.uCallbackMessage = self.callback_message;
        nid.hIcon = state.icon.hicon();
        copy_tooltip(&mut nid, tooltip);

        unsafe {
            if !Shell_NotifyIconW(NIM_ADD, &nid).as_bool() {
                return Err(TrayError::TrayIcon("Failed to add tray icon".to_string()));
            }
        }

        state.is_added = true;
        info!("Tray icon added");
        Ok(())
    }

    /// Remove the tray icon; later updates become no-ops
    pub fn remove(&self) -> TrayResult<()> {
        let mut state = self.state.lock();
        if !state.is_added {
            return Ok(());
        }

        let nid = self.notify_data();
        unsafe {
            if !Shell_NotifyIconW(NIM_DELETE, &nid).as_bool() {
                return Err(TrayError::TrayIcon("Failed to remove tray icon".to_string()));
            }
        }

        state.is_added = false;
        info!("Tray icon removed");
        Ok(())
    }
}

impl TraySurface for TrayIcon {
    type Icon = NativeIcon;

    fn set_icon(&self, icon: Arc<NativeIcon>) -> TrayResult<()> {
        let mut state = self.state.lock();
        if !state.is_added {
            return Ok(());
        }

        let mut nid = self.notify_data();
        nid.uFlags = NIF_ICON;
        nid.hIcon = icon.hicon();

        unsafe {
            if !Shell_NotifyIconW(NIM_MODIFY, &nid).as_bool() {
                return Err(TrayError::TrayIcon("Failed to update tray icon".to_string()));
            }
        }

        state.icon = icon;
        Ok(())
    }

    fn set_tooltip(&self, text: &str) -> TrayResult<()> {
        let state = self.state.lock();
        if !state.is_added {
            return Ok(());
        }

        let mut nid = self.notify_data();
        nid.uFlags = NIF_TIP;
        copy_tooltip(&mut nid, text);

        unsafe {
            if !Shell_NotifyIconW(NIM_MODIFY, &nid).as_bool() {
                return Err(TrayError::TrayIcon("Failed to update tray tooltip".to_string()));
            }
        }
        Ok(())
    }
}

impl Drop for TrayIcon {
    fn drop(&mut self) {
        let _ = self.remove();
    }
}

/// Copy a tooltip into the fixed buffer, truncating and keeping the terminator
fn copy_tooltip(nid: &mut NOTIFYICONDATAW, text: &str) {
    let wide = to_wide_string(text);
    let len = wide.len().min(nid.szTip.len() - 1);
    nid.szTip[..len].copy_from_slice(&wide[..len]);
    nid.szTip[len] = 0;
}

impl TrayMenu {
    /// Show the context menu at the cursor and return the chosen command
    pub fn show(&self, hwnd: HWND) -> Option<TrayCommand> {
        unsafe {
            let menu = CreatePopupMenu().ok()?;

            // Labels must outlive the TrackPopupMenu call
            let labels: Vec<Vec<u16>> = self
                .items()
                .iter()
                .map(|item| match item {
                    TrayMenuItem::Command { label, .. } => to_wide_string(label),
                    TrayMenuItem::Separator => Vec::new(),
                })
                .collect();

            for (item, label) in self.items().iter().zip(&labels) {
                let inserted = match item {
                    TrayMenuItem::Separator => InsertMenuW(menu, u32::MAX, MF_SEPARATOR, 0, PCWSTR::null()),
                    TrayMenuItem::Command { command, is_checked, .. } => {
                        let mut flags = MF_STRING;
                        if *is_checked {
                            flags |= MF_CHECKED;
                        }
                        InsertMenuW(menu, u32::MAX, flags, command.id() as usize, PCWSTR::from_raw(label.as_ptr()))
                    }
                };
                if inserted.is_err() {
                    let _ = DestroyMenu(menu);
                    return None;
                }
            }

            let mut pt = POINT::default();
            if GetCursorPos(&mut pt).is_err() {
                let _ = DestroyMenu(menu);
                return None;
            }

            // Required so the menu closes when the user clicks elsewhere
            let _ = SetForegroundWindow(hwnd);

            let cmd = TrackPopupMenu(menu, TPM_RIGHTBUTTON | TPM_RETURNCMD, pt.x, pt.y, 0, hwnd, None);

            let _ = DestroyMenu(menu);

            if cmd.as_bool() {
                let command = TrayCommand::from_id(cmd.0 as u32);
                debug!("Tray menu selected {:?}", command);
                command
            } else {
                None
            }
        }
    }
}
