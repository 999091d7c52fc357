//! "Start with Windows" through the per-user Run registry key

use log::info;
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, WIN32_ERROR};
use windows::Win32::System::Registry::{
    RegCloseKey, RegDeleteValueW, RegOpenKeyExW, RegSetValueExW, HKEY, HKEY_CURRENT_USER,
    KEY_SET_VALUE, REG_SZ,
};

use crate::config::APP_DIR_NAME;
use crate::error::{TrayError, TrayResult};
use crate::utils::{to_pcwstr, to_wide_string};

const RUN_KEY_PATH: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

/// Open Run key, closed on drop
struct RunKey(HKEY);

impl RunKey {
    fn open() -> TrayResult<Self> {
        let path = to_wide_string(RUN_KEY_PATH);
        let mut hkey = HKEY::default();
        let rc = unsafe { RegOpenKeyExW(HKEY_CURRENT_USER, to_pcwstr(&path), 0, KEY_SET_VALUE, &mut hkey) };
        if rc.is_err() {
            return Err(TrayError::Registry(format!("RegOpenKeyExW failed ({:?})", rc)));
        }
        Ok(Self(hkey))
    }
}

impl Drop for RunKey {
    fn drop(&mut self) {
        unsafe {
            let _ = RegCloseKey(self.0);
        }
    }
}

/// Register or unregister the current executable in the Run key
pub fn set_enabled(enable: bool) -> TrayResult<()> {
    let key = RunKey::open()?;
    let name = to_wide_string(APP_DIR_NAME);

    if enable {
        let exe = std::env::current_exe()?;
        let command = to_wide_string(&format!("\"{}\"", exe.display()));
        let bytes: Vec<u8> = command.iter().flat_map(|c| c.to_le_bytes()).collect();

        let rc = unsafe { RegSetValueExW(key.0, to_pcwstr(&name), 0, REG_SZ, Some(bytes.as_slice())) };
        if rc.is_err() {
            return Err(TrayError::Registry(format!("RegSetValueExW failed ({:?})", rc)));
        }
        info!("Registered auto-start for {:?}", exe);
    } else {
        let rc = unsafe { RegDeleteValueW(key.0, to_pcwstr(&name)) };
        if deletion_removed_value(rc)? {
            info!("Removed auto-start entry");
        } else {
            info!("Auto-start entry was not registered");
        }
    }

    Ok(())
}

/// Whether a Run value was deleted; a missing value already means disabled
fn deletion_removed_value(rc: WIN32_ERROR) -> TrayResult<bool> {
    if rc == ERROR_FILE_NOT_FOUND {
        return Ok(false);
    }
    if rc.is_err() {
        return Err(TrayError::Registry(format!("RegDeleteValueW failed ({:?})", rc)));
    }
    Ok(true)
}
