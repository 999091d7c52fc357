//! Win32 implementation of the WhatsApp window probe

use log::{debug, info, warn};
use parking_lot::Mutex;
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, TRUE};
use windows::Win32::System::Threading::GetCurrentProcessId;
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowPlacement, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
    IsIconic, IsWindow, SetForegroundWindow, SetWindowPlacement, ShowWindow, SW_HIDE, SW_RESTORE,
    SW_SHOWNORMAL, WINDOWPLACEMENT,
};

use super::{
    default_launch_targets, find_foreign_window, is_process_running, launch_first, parse_unread_count,
    WindowProbe, TARGET_PROCESS_NAME, TARGET_TITLE_MARKER,
};

/// Cached handle and placement, shared by the poll thread and the UI thread
///
/// The lock is only held to read or store these fields, never across a
/// window enumeration or any call that may send a message.
#[derive(Default)]
struct ProbeState {
    // Stored as isize for Send + Sync; 0 means unresolved
    hwnd: isize,
    placement: Option<WINDOWPLACEMENT>,
}

impl ProbeState {
    fn window(&self) -> Option<HWND> {
        (self.hwnd != 0).then(|| HWND(self.hwnd as *mut std::ffi::c_void))
    }
}

/// Finds the WhatsApp window by title and drives it through user32
pub struct Win32WindowProbe {
    state: Mutex<ProbeState>,
}

impl Win32WindowProbe {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ProbeState::default()),
        }
    }

    /// Search the top-level windows and cache the first WhatsApp match
    pub fn resolve_window(&self) -> bool {
        self.resolve().is_some()
    }

    fn resolve(&self) -> Option<HWND> {
        let found = lookup_window();
        self.state.lock().hwnd = found.map_or(0, |hwnd| hwnd.0 as isize);
        if let Some(hwnd) = found {
            debug!("Resolved WhatsApp window {:?}", hwnd);
        }
        found
    }

    /// The cached window if it is still alive
    fn cached(&self) -> Option<HWND> {
        let mut state = self.state.lock();
        let hwnd = state.window()?;
        if unsafe { IsWindow(hwnd) }.as_bool() {
            return Some(hwnd);
        }
        debug!("Cached WhatsApp window went stale");
        state.hwnd = 0;
        None
    }

    /// The cached window, or a fresh lookup
    fn current(&self) -> Option<HWND> {
        self.cached().or_else(|| self.resolve())
    }
}

impl Default for Win32WindowProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowProbe for Win32WindowProbe {
    fn is_target_running(&self) -> bool {
        is_process_running(TARGET_PROCESS_NAME) || self.current().is_some()
    }

    fn unread_count(&self) -> u32 {
        self.current()
            .map_or(0, |hwnd| parse_unread_count(&window_title(hwnd)))
    }

    fn show(&self) {
        let Some(hwnd) = self.current() else {
            info!("WhatsApp window not found, launching");
            if let Err(e) = launch_first(&default_launch_targets()) {
                warn!("Failed to launch WhatsApp: {}", e);
            }
            return;
        };
        let placement = self.state.lock().placement;

        unsafe {
            if let Some(placement) = placement.as_ref() {
                if let Err(e) = SetWindowPlacement(hwnd, placement) {
                    warn!("Failed to restore WhatsApp placement: {}", e);
                }
            } else if IsIconic(hwnd).as_bool() {
                let _ = ShowWindow(hwnd, SW_RESTORE);
            } else {
                let _ = ShowWindow(hwnd, SW_SHOWNORMAL);
            }
            let _ = SetForegroundWindow(hwnd);
        }
    }

    fn hide(&self) {
        let Some(hwnd) = self.current() else {
            return;
        };

        let mut placement = WINDOWPLACEMENT {
            length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
            ..Default::default()
        };
        unsafe {
            match GetWindowPlacement(hwnd, &mut placement) {
                Ok(()) => self.state.lock().placement = Some(placement),
                Err(e) => warn!("Failed to capture WhatsApp placement: {}", e),
            }
            let _ = ShowWindow(hwnd, SW_HIDE);
        }
    }
}

/// First top-level WhatsApp window that does not belong to this process
fn lookup_window() -> Option<HWND> {
    let own_pid = unsafe { GetCurrentProcessId() };
    find_foreign_window(
        top_level_windows(),
        |hwnd| window_process_id(*hwnd),
        |hwnd| window_title(*hwnd),
        own_pid,
        TARGET_TITLE_MARKER,
    )
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let handles = &mut *(lparam.0 as *mut Vec<isize>);
    handles.push(hwnd.0 as isize);
    TRUE
}

/// All top-level windows in OS enumeration order
fn top_level_windows() -> Vec<HWND> {
    let mut handles: Vec<isize> = Vec::new();
    unsafe {
        let _ = EnumWindows(Some(collect_window), LPARAM(&mut handles as *mut Vec<isize> as isize));
    }
    handles
        .into_iter()
        .map(|h| HWND(h as *mut std::ffi::c_void))
        .collect()
}

fn window_process_id(hwnd: HWND) -> u32 {
    let mut process_id = 0u32;
    unsafe {
        GetWindowThreadProcessId(hwnd, Some(&mut process_id));
    }
    process_id
}

/// Window title, empty if it has none or the window is gone
fn window_title(hwnd: HWND) -> String {
    unsafe {
        let length = GetWindowTextLengthW(hwnd);
        if length <= 0 {
            return String::new();
        }

        let mut buffer: Vec<u16> = vec![0; (length + 1) as usize];
        let copied = GetWindowTextW(hwnd, &mut buffer);

        if copied > 0 {
            String::from_utf16_lossy(&buffer[..copied as usize])
        } else {
            String::new()
        }
    }
}
