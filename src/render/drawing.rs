//! Pixel-level drawing for tray badge icons
//!
//! Icons are drawn into a straight-alpha RGBA buffer so the same pixels can be
//! handed to the native icon factory or inspected directly.

use image::{Rgba, RgbaImage};

/// Tray icon edge length in logical pixels
pub const ICON_SIZE: u32 = 16;

/// WhatsApp brand green
pub const BRAND_GREEN: Rgba<u8> = Rgba([37, 211, 102, 255]);
/// Neutral gray used while WhatsApp is not running
pub const INACTIVE_GRAY: Rgba<u8> = Rgba([200, 200, 200, 255]);
/// Badge text color
pub const TEXT_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SPACING: u32 = 1;
/// Extra columns each lit pixel is smeared over for the bold weight
const BOLD_EXTRA: u32 = 1;
/// Horizontal advance of one bold glyph, excluding spacing
const CELL_WIDTH: u32 = GLYPH_WIDTH + BOLD_EXTRA;

/// Subsamples per axis when computing edge coverage
const SUPERSAMPLE: u32 = 4;

/// Create a fully transparent icon-sized canvas
pub fn blank_canvas() -> RgbaImage {
    RgbaImage::new(ICON_SIZE, ICON_SIZE)
}

/// Fill a circle inset by one pixel, anti-aliased at the edge
pub fn fill_circle(img: &mut RgbaImage, color: Rgba<u8>) {
    let center = img.width() as f32 / 2.0;
    let radius = center - 1.0;
    let radius_sq = radius * radius;
    let step = 1.0 / SUPERSAMPLE as f32;

    for y in 0..img.height() {
        for x in 0..img.width() {
            let mut inside = 0u32;
            for sy in 0..SUPERSAMPLE {
                for sx in 0..SUPERSAMPLE {
                    let px = x as f32 + (sx as f32 + 0.5) * step - center;
                    let py = y as f32 + (sy as f32 + 0.5) * step - center;
                    if px * px + py * py <= radius_sq {
                        inside += 1;
                    }
                }
            }

            if inside > 0 {
                let coverage = inside as f32 / (SUPERSAMPLE * SUPERSAMPLE) as f32;
                let alpha = (color[3] as f32 * coverage).round() as u8;
                img.put_pixel(x, y, Rgba([color[0], color[1], color[2], alpha]));
            }
        }
    }
}

/// Rows of a 5x7 glyph, most significant of the low five bits is the left column
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
        _ => return None,
    };
    Some(rows)
}

/// Measure text in pixels
pub fn measure_text(text: &str) -> (u32, u32) {
    let count = text.chars().count() as u32;
    if count == 0 {
        return (0, 0);
    }
    (count * CELL_WIDTH + (count - 1) * GLYPH_SPACING, GLYPH_HEIGHT)
}

/// Draw bold text centered on the canvas. Characters without a glyph leave a gap.
pub fn draw_text_centered(img: &mut RgbaImage, text: &str, color: Rgba<u8>) {
    let (width, height) = measure_text(text);
    let origin_x = img.width().saturating_sub(width) / 2;
    let origin_y = img.height().saturating_sub(height) / 2;

    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else {
            continue;
        };
        let left = origin_x + i as u32 * (CELL_WIDTH + GLYPH_SPACING);

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let y = origin_y + row as u32;
                for x in left + col..=left + col + BOLD_EXTRA {
                    if x < img.width() && y < img.height() {
                        img.put_pixel(x, y, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_is_opaque_in_center_and_clear_in_corners() {
        let mut img = blank_canvas();
        fill_circle(&mut img, BRAND_GREEN);
        assert_eq!(*img.get_pixel(8, 8), BRAND_GREEN);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(15, 15)[3], 0);
    }

    #[test]
    fn circle_edge_is_partially_covered() {
        let mut img = blank_canvas();
        fill_circle(&mut img, BRAND_GREEN);
        let partial = img.pixels().filter(|p| p[3] > 0 && p[3] < 255).count();
        assert!(partial > 0);
    }

    #[test]
    fn overflow_label_fits_inside_icon() {
        let (w, h) = measure_text("5+");
        assert!(w <= ICON_SIZE - 2);
        assert!(h <= ICON_SIZE - 2);
    }

    #[test]
    fn text_is_drawn_near_the_middle() {
        let mut img = blank_canvas();
        draw_text_centered(&mut img, "1", TEXT_WHITE);
        // Stem of the "1" glyph
        assert_eq!(*img.get_pixel(7, 7), TEXT_WHITE);
        assert_eq!(img.get_pixel(0, 7)[3], 0);
    }

    #[test]
    fn strokes_are_two_pixels_wide() {
        let mut img = blank_canvas();
        fill_circle(&mut img, BRAND_GREEN);
        draw_text_centered(&mut img, "1", TEXT_WHITE);

        // Vertical stem of the "1", one row below the middle of the glyph
        let row: Vec<bool> = (5..=10).map(|x| *img.get_pixel(x, 7) == TEXT_WHITE).collect();
        assert_eq!(row, [false, false, true, true, false, false]);
    }

    #[test]
    fn bold_glyphs_widen_the_label() {
        assert_eq!(measure_text("5+"), (13, 7));
        assert_eq!(measure_text("3"), (6, 7));
    }
}
