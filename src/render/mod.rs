//! Tray icon rendering
//!
//! `drawing` rasterizes badge states into RGBA pixels, `icons` maps states to
//! cached icon resources, and `native` turns pixels into Win32 icons.

pub mod drawing;
pub mod icons;
#[cfg(windows)]
pub mod native;

pub use icons::{IconCache, IconFactory, IconKey};
#[cfg(windows)]
pub use native::{HiconFactory, NativeIcon};
