//! X11 display integration tests
//!
//! These tests exercise `X11Display` against a live X server. They self-skip
//! when `$DISPLAY` is not set, so they can run in headless CI via `xvfb`:
//!
//! ```bash
//! xvfb-run -a cargo test --test x11_integration_tests
//! ```
//!
//! The interactive selection itself needs a user; that test is ignored.

#[cfg(all(target_os = "linux", feature = "linux-x11"))]
mod tests {
    use scrot_select::{
        Selector,
        display::{CursorShape, ScreenSource, SelectionDisplay, X11Display},
        model::{SelectionOptions, SelectionRect},
    };

    /// Helper to skip test if $DISPLAY not set
    fn check_x11_available() -> bool {
        std::env::var("DISPLAY").is_ok()
    }

    fn connect() -> Option<X11Display> {
        if !check_x11_available() {
            eprintln!("Skipping: DISPLAY not set");
            return None;
        }
        Some(X11Display::connect(None).unwrap())
    }

    #[test]
    fn test_screen_size_matches_root_geometry() {
        let Some(display) = connect() else { return };
        let size = display.screen_size();
        assert!(size.width > 0 && size.height > 0);

        let root = display.window_geometry(display.root(), true).unwrap().unwrap();
        assert_eq!((root.w as i32, root.h as i32), (size.width, size.height));
    }

    #[test]
    fn test_named_colors() {
        let Some(display) = connect() else { return };
        let gray = display.alloc_named_color("gray").unwrap().unwrap();
        assert_eq!(gray.rgb8(), [0xbe, 0xbe, 0xbe]);
        assert!(display.alloc_named_color("surely-not-a-colour").unwrap().is_none());
    }

    #[test]
    fn test_font_cursors_create_and_free() {
        let Some(display) = connect() else { return };
        for shape in [CursorShape::Cross, CursorShape::SprayCan, CursorShape::Target] {
            let cursor = display.create_font_cursor(shape).unwrap();
            display.free_cursor(cursor);
        }
        display.sync_discard();
    }

    #[test]
    fn test_grab_region_dimensions() {
        let Some(display) = connect() else { return };
        let image = display.grab_region(SelectionRect::new(0, 0, 32, 16)).unwrap();
        assert_eq!(image.dimensions(), (32, 16));
        assert!(image.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_display_closes_cleanly_and_reconnects() {
        let Some(display) = connect() else { return };
        let cursor = display.create_font_cursor(CursorShape::Cross).unwrap();
        display.free_cursor(cursor);
        drop(display);

        let Some(again) = connect() else { return };
        assert!(again.screen_size().width > 0);
    }

    #[test]
    #[ignore = "Requires a user to drag a rectangle on a live X11 session"]
    fn test_interactive_selection() {
        let Some(display) = connect() else { return };
        let mut selector = Selector::new(&display, SelectionOptions::default());
        let rect = selector.get_user_selection().unwrap();
        eprintln!("Selected: {:?}", rect);
    }
}
