//! Access to the WhatsApp desktop window
//!
//! The unread count is scraped from the window title, which WhatsApp renders
//! as `WhatsApp (N)` while messages are pending. That is a best-effort reading
//! of free-form text, not a contract: a localized title, a different format or
//! a build that drops the count all read as zero.

#[cfg(windows)]
pub mod win32;

use log::{info, warn};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use sysinfo::{ProcessRefreshKind, RefreshKind, System};

use crate::error::{TrayError, TrayResult};

#[cfg(windows)]
pub use win32::Win32WindowProbe;

/// Substring identifying the WhatsApp window title
pub const TARGET_TITLE_MARKER: &str = "WhatsApp";
/// Process name (without extension) of the WhatsApp desktop app
pub const TARGET_PROCESS_NAME: &str = "WhatsApp";
/// Store app id launched through the shell AppsFolder
const STORE_APP_ID: &str = r"5319275A.WhatsAppDesktop_cv1g1gvanyjgm!App";

/// Operations the monitor and the tray menu need from the target window
pub trait WindowProbe: Send + Sync {
    /// Whether WhatsApp appears to be running
    fn is_target_running(&self) -> bool;

    /// Unread count read from the window title, 0 when unknown
    fn unread_count(&self) -> u32;

    /// Restore and focus the window, launching WhatsApp if there is none
    fn show(&self);

    /// Remember the window placement and hide it
    fn hide(&self);
}

/// Extract the count between the last `(` and the last `)` of a title
pub fn parse_unread_count(title: &str) -> u32 {
    let (Some(open), Some(close)) = (title.rfind('('), title.rfind(')')) else {
        return 0;
    };
    if close <= open {
        return 0;
    }

    title[open + 1..close].trim().parse().unwrap_or(0)
}

/// Return the first item whose title contains `marker`
pub fn find_titled<T, I, F>(items: I, title_of: F, marker: &str) -> Option<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> String,
{
    items.into_iter().find(|item| title_of(item).contains(marker))
}

/// First window of another process whose title contains `marker`
///
/// Titles of windows owned by `own_pid` are never read: for same-process
/// windows that sends `WM_GETTEXT` to the owning thread, and our own hidden
/// window must not be mistaken for WhatsApp.
pub fn find_foreign_window<T, P, F>(
    windows: Vec<T>,
    owner_of: P,
    title_of: F,
    own_pid: u32,
    marker: &str,
) -> Option<T>
where
    P: Fn(&T) -> u32,
    F: Fn(&T) -> String,
{
    let foreign = windows.into_iter().filter(|window| owner_of(window) != own_pid);
    find_titled(foreign, title_of, marker)
}

/// Check the running process list for `name` (extension and case ignored)
pub fn is_process_running(name: &str) -> bool {
    let system = System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::new()),
    );
    system
        .processes()
        .values()
        .any(|process| process_name_matches(process.name(), name))
}

fn process_name_matches(process_name: impl AsRef<OsStr>, name: &str) -> bool {
    Path::new(process_name.as_ref())
        .file_stem()
        .is_some_and(|stem| stem.eq_ignore_ascii_case(name))
}

/// One way of starting WhatsApp
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchTarget {
    /// `explorer.exe shell:AppsFolder\<app id>`
    ShellAppsFolder(String),
    /// Direct path to the executable, used only if it exists
    Executable(PathBuf),
    /// Let the OS resolve the bare program name
    BareName(String),
}

impl LaunchTarget {
    fn command(&self) -> Option<Command> {
        match self {
            LaunchTarget::ShellAppsFolder(app_id) => {
                let mut cmd = Command::new("explorer.exe");
                cmd.arg(format!(r"shell:AppsFolder\{}", app_id));
                Some(cmd)
            }
            LaunchTarget::Executable(path) => path.exists().then(|| Command::new(path)),
            LaunchTarget::BareName(name) => Some(Command::new(name)),
        }
    }
}

/// Launch paths in the order they are tried
pub fn launch_targets(program_files: Option<PathBuf>, program_files_x86: Option<PathBuf>) -> Vec<LaunchTarget> {
    let mut targets = vec![LaunchTarget::ShellAppsFolder(STORE_APP_ID.to_string())];

    for root in [program_files, program_files_x86].into_iter().flatten() {
        targets.push(LaunchTarget::Executable(
            root.join("WindowsApps").join("WhatsApp").join("WhatsApp.exe"),
        ));
    }

    targets.push(LaunchTarget::BareName(TARGET_PROCESS_NAME.to_string()));
    targets
}

/// Launch paths for this machine's install roots
pub fn default_launch_targets() -> Vec<LaunchTarget> {
    launch_targets(
        std::env::var_os("ProgramFiles").map(PathBuf::from),
        std::env::var_os("ProgramFiles(x86)").map(PathBuf::from),
    )
}

/// Try each target in order; the first one that spawns wins
pub fn launch_first(targets: &[LaunchTarget]) -> TrayResult<()> {
    for target in targets {
        let Some(mut cmd) = target.command() else {
            continue;
        };
        match cmd.spawn() {
            Ok(_) => {
                info!("Launched WhatsApp via {:?}", target);
                return Ok(());
            }
            Err(e) => warn!("Failed to launch WhatsApp via {:?}: {}", target, e),
        }
    }

    Err(TrayError::Launch("no launch path succeeded".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_with_count() {
        assert_eq!(parse_unread_count("WhatsApp (3)"), 3);
        assert_eq!(parse_unread_count("(12) WhatsApp"), 12);
        assert_eq!(parse_unread_count("WhatsApp ( 7 )"), 7);
    }

    #[test]
    fn title_without_count() {
        assert_eq!(parse_unread_count("WhatsApp"), 0);
        assert_eq!(parse_unread_count(""), 0);
        assert_eq!(parse_unread_count("WhatsApp (abc)"), 0);
        assert_eq!(parse_unread_count("WhatsApp (-2)"), 0);
    }

    #[test]
    fn last_parenthesized_group_wins() {
        assert_eq!(parse_unread_count("Chat (2) - WhatsApp (9)"), 9);
    }

    #[test]
    fn mismatched_parentheses() {
        assert_eq!(parse_unread_count("WhatsApp )4("), 0);
        assert_eq!(parse_unread_count("WhatsApp (4"), 0);
    }

    #[test]
    fn first_matching_title_is_returned() {
        let windows = vec![(1, "Explorer"), (2, "WhatsApp (1)"), (3, "WhatsApp")];
        let found = find_titled(windows, |w| w.1.to_string(), TARGET_TITLE_MARKER);
        assert_eq!(found.map(|w| w.0), Some(2));
    }

    #[test]
    fn no_matching_title() {
        let windows = vec!["Notepad", "Calculator"];
        assert_eq!(find_titled(windows, |w| w.to_string(), TARGET_TITLE_MARKER), None);
    }

    #[test]
    fn own_process_windows_are_skipped() {
        use std::cell::RefCell;

        let own_pid = 4242;
        // (handle, owner pid, title)
        let windows = vec![
            (1, own_pid, "WhatsApp Tray Manager"),
            (2, 7, "Explorer"),
            (3, 9, "WhatsApp (3)"),
        ];
        let titles_read = RefCell::new(Vec::new());

        let found = find_foreign_window(
            windows,
            |w| w.1,
            |w| {
                titles_read.borrow_mut().push(w.0);
                w.2.to_string()
            },
            own_pid,
            TARGET_TITLE_MARKER,
        );

        assert_eq!(found.map(|w| w.0), Some(3));
        assert_eq!(*titles_read.borrow(), [2, 3]);
    }

    #[test]
    fn only_own_windows_means_not_found() {
        let windows = vec![(1, 10, "WhatsApp Tray Manager"), (2, 10, "Default IME")];
        let found = find_foreign_window(windows, |w| w.1, |w| w.2.to_string(), 10, TARGET_TITLE_MARKER);
        assert_eq!(found, None);
    }

    #[test]
    fn process_names_match_without_extension() {
        assert!(process_name_matches("WhatsApp.exe", "WhatsApp"));
        assert!(process_name_matches("whatsapp", "WhatsApp"));
        assert!(!process_name_matches("WhatsAppTray.exe", "WhatsApp"));
    }

    #[test]
    fn launch_order() {
        let targets = launch_targets(
            Some(PathBuf::from(r"C:\Program Files")),
            Some(PathBuf::from(r"C:\Program Files (x86)")),
        );
        assert_eq!(targets.len(), 4);
        assert!(matches!(&targets[0], LaunchTarget::ShellAppsFolder(id) if id.contains("WhatsAppDesktop")));
        assert!(matches!(&targets[1], LaunchTarget::Executable(p) if p.starts_with(r"C:\Program Files")));
        assert!(matches!(&targets[2], LaunchTarget::Executable(p) if p.starts_with(r"C:\Program Files (x86)")));
        assert_eq!(targets[3], LaunchTarget::BareName("WhatsApp".to_string()));
    }

    #[test]
    fn missing_install_roots_are_skipped() {
        let targets = launch_targets(None, None);
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn missing_executable_is_not_spawned() {
        let target = LaunchTarget::Executable(PathBuf::from("/definitely/not/here/WhatsApp.exe"));
        assert!(target.command().is_none());
    }
}
