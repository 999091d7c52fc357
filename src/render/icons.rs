//! Tray icon states and the per-instance icon cache

use image::RgbaImage;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use super::drawing::{blank_canvas, draw_text_centered, fill_circle, BRAND_GREEN, INACTIVE_GRAY, TEXT_WHITE};
use crate::error::TrayResult;

/// Highest count that gets its own badge
pub const MAX_BADGE_COUNT: u32 = 5;

/// Visual state of the tray icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKey {
    /// WhatsApp running, nothing unread
    Default,
    /// WhatsApp not running
    Inactive,
    /// 1..=5 unread messages; other values are folded into `Default` or
    /// `CountOverflow` by [`IconKey::normalized`] before rendering or caching
    Count(u8),
    /// More than five unread messages
    CountOverflow,
}

impl IconKey {
    /// Pick the icon for an observed running state and unread count
    pub fn select(running: bool, unread: u32) -> Self {
        if !running {
            return IconKey::Inactive;
        }
        match unread {
            0 => IconKey::Default,
            n if n <= MAX_BADGE_COUNT => IconKey::Count(n as u8),
            _ => IconKey::CountOverflow,
        }
    }

    /// Fold a `Count` outside 1..=5 into the key that shows it
    pub fn normalized(self) -> Self {
        match self {
            IconKey::Count(0) => IconKey::Default,
            IconKey::Count(n) if u32::from(n) > MAX_BADGE_COUNT => IconKey::CountOverflow,
            key => key,
        }
    }

    /// Text drawn on top of the circle, if any
    pub fn badge_text(&self) -> Option<String> {
        match self.normalized() {
            IconKey::Count(n) => Some(n.to_string()),
            IconKey::CountOverflow => Some(format!("{}+", MAX_BADGE_COUNT)),
            IconKey::Default | IconKey::Inactive => None,
        }
    }

    /// Draw this state into a fresh canvas
    pub fn render(&self) -> RgbaImage {
        let mut img = blank_canvas();
        let fill = match self {
            IconKey::Inactive => INACTIVE_GRAY,
            _ => BRAND_GREEN,
        };
        fill_circle(&mut img, fill);

        if let Some(text) = self.badge_text() {
            draw_text_centered(&mut img, &text, TEXT_WHITE);
        }
        img
    }
}

/// Turns rendered pixels into an icon resource the tray can display
pub trait IconFactory {
    type Icon: Send + Sync;

    fn create_icon(&self, pixels: &RgbaImage) -> TrayResult<Self::Icon>;
}

/// Lazily renders one icon per key and keeps it for the cache's lifetime
pub struct IconCache<F: IconFactory> {
    factory: F,
    icons: HashMap<IconKey, Arc<F::Icon>>,
}

impl<F: IconFactory> IconCache<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            icons: HashMap::new(),
        }
    }

    /// Get the icon for `key`, rendering it on first use
    pub fn get_icon(&mut self, key: IconKey) -> TrayResult<Arc<F::Icon>> {
        let key = key.normalized();
        if let Some(icon) = self.icons.get(&key) {
            return Ok(icon.clone());
        }

        debug!("Rendering tray icon for {:?}", key);
        let icon = Arc::new(self.factory.create_icon(&key.render())?);
        self.icons.insert(key, icon.clone());
        Ok(icon)
    }

    /// Number of icons rendered so far
    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::TrayError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Keeps the raw pixels as the "icon" and counts renders
    #[derive(Default)]
    pub(crate) struct PixelFactory {
        pub renders: Arc<AtomicUsize>,
    }

    impl IconFactory for PixelFactory {
        type Icon = RgbaImage;

        fn create_icon(&self, pixels: &RgbaImage) -> TrayResult<RgbaImage> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            Ok(pixels.clone())
        }
    }

    struct BrokenFactory;

    impl IconFactory for BrokenFactory {
        type Icon = ();

        fn create_icon(&self, _pixels: &RgbaImage) -> TrayResult<()> {
            Err(TrayError::IconRender("out of GDI handles".to_string()))
        }
    }

    #[test]
    fn running_with_small_counts() {
        assert_eq!(IconKey::select(true, 0), IconKey::Default);
        for n in 1..=5u32 {
            assert_eq!(IconKey::select(true, n), IconKey::Count(n as u8));
        }
    }

    #[test]
    fn running_with_large_counts_overflows() {
        for n in [6u32, 7, 42, u32::MAX] {
            assert_eq!(IconKey::select(true, n), IconKey::CountOverflow);
        }
    }

    #[test]
    fn not_running_is_always_inactive() {
        for n in [0u32, 1, 5, 6, 100] {
            assert_eq!(IconKey::select(false, n), IconKey::Inactive);
        }
    }

    #[test]
    fn out_of_range_counts_fold_into_valid_keys() {
        assert_eq!(IconKey::Count(0).normalized(), IconKey::Default);
        assert_eq!(IconKey::Count(42).normalized(), IconKey::CountOverflow);
        assert_eq!(IconKey::Count(5).normalized(), IconKey::Count(5));
        assert_eq!(IconKey::Count(0).badge_text(), None);
        assert_eq!(IconKey::Count(42).badge_text().as_deref(), Some("5+"));
        assert_eq!(IconKey::Count(42).render(), IconKey::CountOverflow.render());
    }

    #[test]
    fn out_of_range_count_shares_the_overflow_icon() {
        let mut cache = IconCache::new(PixelFactory::default());
        let overflow = cache.get_icon(IconKey::CountOverflow).expect("render");
        let big = cache.get_icon(IconKey::Count(42)).expect("render");
        assert!(Arc::ptr_eq(&overflow, &big));
        assert_eq!(cache.len(), 1);
    }
    #[test]
    fn badge_text_per_key() {
        assert_eq!(IconKey::Default.badge_text(), None);
        assert_eq!(IconKey::Inactive.badge_text(), None);
        assert_eq!(IconKey::Count(3).badge_text().as_deref(), Some("3"));
        assert_eq!(IconKey::CountOverflow.badge_text().as_deref(), Some("5+"));
    }

    #[test]
    fn inactive_is_gray_and_active_is_green() {
        assert_eq!(*IconKey::Inactive.render().get_pixel(4, 8), INACTIVE_GRAY);
        assert_eq!(*IconKey::Default.render().get_pixel(4, 8), BRAND_GREEN);
        assert_eq!(*IconKey::CountOverflow.render().get_pixel(8, 13), BRAND_GREEN);
    }

    #[test]
    fn count_icons_carry_white_text() {
        let img = IconKey::Count(4).render();
        assert!(img.pixels().any(|p| *p == TEXT_WHITE));
        let plain = IconKey::Default.render();
        assert!(!plain.pixels().any(|p| *p == TEXT_WHITE));
    }

    #[test]
    fn get_icon_is_cached() {
        let factory = PixelFactory::default();
        let renders = factory.renders.clone();
        let mut cache = IconCache::new(factory);

        let first = cache.get_icon(IconKey::Count(2)).expect("render");
        let second = cache.get_icon(IconKey::Count(2)).expect("render");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(renders.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_keys_render_separately() {
        let factory = PixelFactory::default();
        let renders = factory.renders.clone();
        let mut cache = IconCache::new(factory);

        cache.get_icon(IconKey::Default).expect("render");
        cache.get_icon(IconKey::Inactive).expect("render");
        cache.get_icon(IconKey::Default).expect("render");

        assert_eq!(renders.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn render_failure_is_reported_and_not_cached() {
        let mut cache = IconCache::new(BrokenFactory);
        assert!(matches!(
            cache.get_icon(IconKey::Default),
            Err(TrayError::IconRender(_))
        ));
        assert!(cache.is_empty());
    }
}
