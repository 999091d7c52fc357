//! Utility functions for the Windows API

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use windows::core::PCWSTR;

/// Convert a Rust string to a wide string for Windows API
pub fn to_wide_string(s: &str) -> Vec<u16> {
    OsStr::new(s)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Create a PCWSTR from a wide string slice
pub fn to_pcwstr(s: &[u16]) -> PCWSTR {
    PCWSTR::from_raw(s.as_ptr())
}
