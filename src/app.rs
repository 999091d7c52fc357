//! Main application logic for WhatsApp Tray
//!
//! Owns a hidden window that receives tray callbacks, the tray icon, the
//! WhatsApp window probe and the message monitor.

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::autostart;
use crate::config::SettingsStore;
use crate::monitor::{MessageMonitor, APP_TITLE};
use crate::probe::{Win32WindowProbe, WindowProbe};
use crate::render::{HiconFactory, IconCache, IconKey};
use crate::tray::{TrayCommand, TrayIcon, TrayMenu};
use crate::utils::{to_pcwstr, to_wide_string};

/// Window class name
const WINDOW_CLASS: &str = "UnreadBadgeTrayWindowClass";

/// Title of the hidden window; must not contain the WhatsApp title marker
const HOST_WINDOW_TITLE: &str = "Unread Badge Tray Host";

/// Tray icon callback message
pub const WM_TRAY_CALLBACK: u32 = WM_APP + 1;

type Monitor = MessageMonitor<Win32WindowProbe, TrayIcon, HiconFactory>;

/// State reachable from the window procedure
struct AppState {
    settings: Mutex<SettingsStore>,
    probe: Arc<Win32WindowProbe>,
    tray: Arc<TrayIcon>,
    monitor: Monitor,
}

static APP_STATE: OnceCell<Arc<AppState>> = OnceCell::new();

/// Main application state
pub struct Application {
    state: Arc<AppState>,
}

impl Application {
    /// Create the hidden window and tray icon
    pub fn new(settings: SettingsStore) -> Result<Self> {
        info!("Initializing WhatsApp Tray application");

        let class_name = to_wide_string(WINDOW_CLASS);
        register_window_class(&class_name)?;
        let hwnd = create_window(&class_name)?;

        // A broken icon pipeline leaves nothing useful to show
        let mut icons = IconCache::new(HiconFactory);
        let default_icon = icons
            .get_icon(IconKey::Default)
            .context("Failed to render the tray icon")?;

        let tray = Arc::new(TrayIcon::new(hwnd, WM_TRAY_CALLBACK, default_icon, APP_TITLE)?);
        let probe = Arc::new(Win32WindowProbe::new());
        let monitor = MessageMonitor::new(probe.clone(), tray.clone(), icons);

        let state = Arc::new(AppState {
            settings: Mutex::new(settings),
            probe,
            tray,
            monitor,
        });
        if APP_STATE.set(state.clone()).is_err() {
            bail!("Application already initialized");
        }

        Ok(Self { state })
    }

    /// Start monitoring and run the message loop until Exit
    pub fn run(&self) -> Result<()> {
        self.state.monitor.start()?;

        info!("Starting message loop");
        unsafe {
            let mut msg = MSG::default();
            while GetMessageW(&mut msg, None, 0, 0).into() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }

        self.state.monitor.stop();
        info!("Message loop ended");
        Ok(())
    }
}

/// Register the window class
fn register_window_class(class_name: &[u16]) -> Result<()> {
    unsafe {
        let hinstance = GetModuleHandleW(None)?;

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            lpfnWndProc: Some(window_proc),
            hInstance: hinstance.into(),
            lpszClassName: to_pcwstr(class_name),
            ..Default::default()
        };

        if RegisterClassExW(&wc) == 0 {
            bail!("Failed to register window class");
        }
    }
    Ok(())
}

/// Create the hidden window that owns the tray icon
fn create_window(class_name: &[u16]) -> Result<HWND> {
    let title = to_wide_string(HOST_WINDOW_TITLE);

    unsafe {
        let hinstance = GetModuleHandleW(None)?;

        let hwnd = CreateWindowExW(
            WS_EX_TOOLWINDOW,
            to_pcwstr(class_name),
            to_pcwstr(&title),
            WS_OVERLAPPED,
            0,
            0,
            0,
            0,
            None,
            None,
            hinstance,
            None,
        )?;

        if hwnd.0.is_null() {
            bail!("Failed to create window");
        }
        Ok(hwnd)
    }
}

/// Window procedure for the hidden window
unsafe extern "system" fn window_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_TRAY_CALLBACK => {
            if let Some(state) = APP_STATE.get() {
                handle_tray_event(hwnd, state, lparam);
            }
            LRESULT(0)
        }

        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

fn handle_tray_event(hwnd: HWND, state: &AppState, lparam: LPARAM) {
    let event = (lparam.0 & 0xFFFF) as u32;

    match event {
        WM_LBUTTONDBLCLK => {
            debug!("Tray icon double clicked");
            state.probe.show();
        }
        WM_RBUTTONUP | WM_CONTEXTMENU => {
            let menu = TrayMenu::new(state.settings.lock().auto_start_enabled());
            if let Some(command) = menu.show(hwnd) {
                handle_command(hwnd, state, command);
            }
        }
        _ => {}
    }
}

fn handle_command(hwnd: HWND, state: &AppState, command: TrayCommand) {
    match command {
        TrayCommand::OpenWhatsApp => state.probe.show(),

        TrayCommand::ToggleAutoStart => {
            let mut settings = state.settings.lock();
            let enabled = !settings.auto_start_enabled();
            settings.set_auto_start_enabled(enabled);

            if let Err(e) = autostart::set_enabled(enabled) {
                warn!("Failed to update auto-start registration: {}", e);
            }
        }

        TrayCommand::Exit => {
            info!("Exit requested from tray menu");
            state.monitor.stop();
            if let Err(e) = state.tray.remove() {
                warn!("{}", e);
            }
            state.probe.hide();
            unsafe {
                let _ = DestroyWindow(hwnd);
            }
        }
    }
}
