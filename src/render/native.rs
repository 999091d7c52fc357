//! Native HICON creation from rendered pixels

use image::RgbaImage;
use log::warn;
use windows::Win32::Foundation::{HWND, TRUE};
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::UI::WindowsAndMessaging::{CreateIconIndirect, DestroyIcon, HICON, ICONINFO};

use super::icons::IconFactory;
use crate::error::{TrayError, TrayResult};

/// An owned icon handle, destroyed when dropped
///
/// The handle is stored as an isize so the icon can be shared with the poll
/// thread.
#[derive(Debug)]
pub struct NativeIcon {
    handle: isize,
}

impl NativeIcon {
    pub fn hicon(&self) -> HICON {
        HICON(self.handle as *mut std::ffi::c_void)
    }
}

impl Drop for NativeIcon {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyIcon(self.hicon());
        }
    }
}

/// Screen DC released on drop
struct ScreenDc(HDC);

impl ScreenDc {
    fn acquire() -> TrayResult<Self> {
        let hdc = unsafe { GetDC(HWND::default()) };
        if hdc.is_invalid() {
            return Err(TrayError::IconRender("GetDC failed".to_string()));
        }
        Ok(Self(hdc))
    }
}

impl Drop for ScreenDc {
    fn drop(&mut self) {
        unsafe {
            let _ = ReleaseDC(HWND::default(), self.0);
        }
    }
}

/// GDI bitmap deleted on drop
struct OwnedBitmap(HBITMAP);

impl Drop for OwnedBitmap {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            unsafe {
                let _ = DeleteObject(self.0);
            }
        }
    }
}

/// Builds 32bpp alpha icons through a DIB section and an empty mask
#[derive(Debug, Default, Clone, Copy)]
pub struct HiconFactory;

impl HiconFactory {
    /// Create a top-down 32bpp DIB section holding `pixels` as BGRA
    fn color_bitmap(pixels: &RgbaImage) -> TrayResult<OwnedBitmap> {
        let width = pixels.width() as i32;
        let height = pixels.height() as i32;

        let bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                biHeight: -height, // top-down
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0 as u32,
                ..Default::default()
            },
            bmiColors: [RGBQUAD::default(); 1],
        };

        let screen = ScreenDc::acquire()?;
        let mut bits: *mut std::ffi::c_void = std::ptr::null_mut();
        let bitmap = unsafe {
            CreateDIBSection(screen.0, &bmi, DIB_RGB_COLORS, &mut bits as *mut _ as *mut _, None, 0)?
        };
        let bitmap = OwnedBitmap(bitmap);
        drop(screen);

        if bitmap.0.is_invalid() || bits.is_null() {
            return Err(TrayError::IconRender("CreateDIBSection returned no pixels".to_string()));
        }

        let src = pixels.as_raw();
        let dst = unsafe { std::slice::from_raw_parts_mut(bits as *mut u8, src.len()) };
        for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
            // RGBA -> BGRA
            d[0] = s[2];
            d[1] = s[1];
            d[2] = s[0];
            d[3] = s[3];
        }

        Ok(bitmap)
    }

    /// Monochrome AND mask; all zero so the alpha channel decides
    fn mask_bitmap(width: i32, height: i32) -> TrayResult<OwnedBitmap> {
        let stride = (((width + 15) / 16) * 2) as usize;
        let zeros = vec![0u8; stride * height as usize];
        let bitmap = unsafe { CreateBitmap(width, height, 1, 1, Some(zeros.as_ptr() as *const _)) };
        if bitmap.is_invalid() {
            return Err(TrayError::IconRender("CreateBitmap failed for icon mask".to_string()));
        }
        Ok(OwnedBitmap(bitmap))
    }
}

impl IconFactory for HiconFactory {
    type Icon = NativeIcon;

    fn create_icon(&self, pixels: &RgbaImage) -> TrayResult<NativeIcon> {
        let color = Self::color_bitmap(pixels)?;
        let mask = Self::mask_bitmap(pixels.width() as i32, pixels.height() as i32)?;

        let info = ICONINFO {
            fIcon: TRUE,
            xHotspot: 0,
            yHotspot: 0,
            hbmMask: mask.0,
            hbmColor: color.0,
        };

        // The icon copies both bitmaps; ours are released when the guards drop
        let hicon = unsafe { CreateIconIndirect(&info) }.map_err(|e| {
            warn!("CreateIconIndirect failed: {}", e);
            TrayError::IconRender(e.to_string())
        })?;

        Ok(NativeIcon {
            handle: hicon.0 as isize,
        })
    }
}
