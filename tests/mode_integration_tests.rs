//! Integration tests for the capture, hide and hole modes
//!
//! The mock screen shows `MockDisplay::pixel_at(x, y)` at every root
//! coordinate, so the expected pixels of a grab are known exactly.

mod common;

use image::Rgba;
use scrot_select::{
    display::{
        InputEvent, MockDisplay, PointerImage,
        mock::{DisplayCall, keycode},
    },
    error::SelectionError,
    model::{LineOptions, SelectionMode, SelectionOptions, SelectionRect},
    util::encode::{DEFAULT_QUALITY, save_image},
};

use crate::common::{drag, key, selector};

fn options(mode: SelectionMode, color: &str, opacity: u8) -> SelectionOptions {
    SelectionOptions {
        mode,
        line: LineOptions {
            color: Some(color.to_string()),
            opacity,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_capture_grabs_selected_region() {
    let display = MockDisplay::new(800, 600).with_batch(drag((10, 20), (74, 52)));
    let mut selector = selector(&display, SelectionOptions::default());

    let capture = selector.select_mode().unwrap().unwrap();
    assert_eq!(capture.dimensions(), (64, 32));
    assert_eq!(capture.pixel(0, 0), MockDisplay::pixel_at(10, 20));
    assert_eq!(capture.pixel(63, 31), MockDisplay::pixel_at(73, 51));
    assert!(display.calls().contains(&DisplayCall::GrabRegion(SelectionRect::new(10, 20, 64, 32))));
}

#[test]
fn test_hole_keeps_inner_rectangle() {
    let display = MockDisplay::new(800, 600)
        .with_batch(drag((0, 0), (200, 200)))
        .with_batch(drag((50, 50), (100, 100)));
    let mut selector = selector(&display, options(SelectionMode::Hole, "red", 255));

    let capture = selector.select_mode().unwrap().unwrap();
    assert_eq!(capture.dimensions(), (200, 200));

    // Inside the hole the original pixels survive
    for (x, y) in [(50, 50), (75, 75), (99, 99)] {
        assert_eq!(capture.pixel(x, y), MockDisplay::pixel_at(x as i32, y as i32));
    }
    // Outside it everything is covered
    for (x, y) in [(0, 0), (49, 50), (100, 99), (199, 199)] {
        assert_eq!(capture.pixel(x, y), Rgba([255, 0, 0, 255]));
    }
}

#[test]
fn test_hole_relative_to_outer_origin() {
    let display = MockDisplay::new(800, 600)
        .with_batch(drag((100, 100), (300, 300)))
        .with_batch(drag((150, 150), (200, 200)));
    let mut selector = selector(&display, options(SelectionMode::Hole, "black", 255));

    let capture = selector.select_mode().unwrap().unwrap();
    assert_eq!(capture.pixel(50, 50), MockDisplay::pixel_at(150, 150));
    assert_eq!(capture.pixel(49, 49), Rgba([0, 0, 0, 255]));
}

#[test]
fn test_hide_covers_only_inner_rectangle() {
    let display = MockDisplay::new(800, 600)
        .with_batch(drag((0, 0), (200, 200)))
        .with_batch(drag((50, 50), (100, 100)));
    let mut selector = selector(&display, options(SelectionMode::Hide, "white", 255));

    let capture = selector.select_mode().unwrap().unwrap();
    assert_eq!(capture.pixel(50, 50), Rgba([255, 255, 255, 255]));
    assert_eq!(capture.pixel(99, 99), Rgba([255, 255, 255, 255]));
    assert_eq!(capture.pixel(100, 100), MockDisplay::pixel_at(100, 100));
    assert_eq!(capture.pixel(10, 10), MockDisplay::pixel_at(10, 10));
}

#[test]
fn test_hide_inner_outside_capture_is_clipped() {
    let display = MockDisplay::new(800, 600)
        .with_batch(drag((0, 0), (100, 100)))
        .with_batch(drag((80, 80), (300, 300)));
    let mut selector = selector(&display, options(SelectionMode::Hide, "black", 255));

    let capture = selector.select_mode().unwrap().unwrap();
    assert_eq!(capture.dimensions(), (100, 100));
    assert_eq!(capture.pixel(99, 99), Rgba([0, 0, 0, 255]));
    assert_eq!(capture.pixel(79, 79), MockDisplay::pixel_at(79, 79));
}

#[test]
fn test_first_pass_uses_capture_cursor() {
    use scrot_select::display::CursorShape;

    let display = MockDisplay::new(800, 600)
        .with_batch(drag((0, 0), (200, 200)))
        .with_batch(drag((50, 50), (100, 100)));
    let mut selector = selector(&display, options(SelectionMode::Hide, "gray", 100));
    selector.select_mode().unwrap().unwrap();

    let main_cursors: Vec<_> = display
        .calls()
        .iter()
        .filter_map(|c| match c {
            DisplayCall::CreateCursor(shape @ (CursorShape::Cross | CursorShape::SprayCan), _) => {
                Some(*shape)
            }
            _ => None,
        })
        .collect();
    assert_eq!(main_cursors, vec![CursorShape::Cross, CursorShape::SprayCan]);
    assert_eq!(selector.options().mode, SelectionMode::Hide);
}

#[test]
fn test_abort_in_first_pass() {
    let display = MockDisplay::new(800, 600).with_batch(vec![key(keycode::ESCAPE)]);
    let mut selector = selector(&display, options(SelectionMode::Hole, "gray", 100));

    assert!(selector.select_mode().unwrap().is_none());
    assert_eq!(display.count(|c| *c == DisplayCall::GrabKeyboard), 1);
    assert_eq!(selector.options().mode, SelectionMode::Hole);
}

#[test]
fn test_abort_in_second_pass() {
    let display = MockDisplay::new(800, 600)
        .with_batch(drag((0, 0), (200, 200)))
        .with_batch(vec![key(keycode::A)]);
    let mut selector = selector(&display, options(SelectionMode::Hide, "gray", 100));

    assert!(selector.select_mode().unwrap().is_none());
    assert_eq!(display.count(|c| matches!(c, DisplayCall::GrabRegion(_))), 0);
}

#[test]
fn test_unknown_fill_color_is_fatal() {
    let display = MockDisplay::new(800, 600)
        .with_batch(drag((0, 0), (200, 200)))
        .with_batch(drag((50, 50), (100, 100)));
    let mut selector = selector(&display, options(SelectionMode::Hole, "no-such-colour", 100));

    // The outline of the first pass already needs the colour
    let err = selector.select_mode().unwrap_err();
    assert!(matches!(err, SelectionError::ColorAllocation { .. }));
}

#[test]
fn test_pointer_recorded_on_click_selection() {
    let pointer = PointerImage {
        x:      15,
        y:      15,
        width:  1,
        height: 1,
        xhot:   0,
        yhot:   0,
        pixels: vec![0xff00_ff00],
    };
    let display = MockDisplay::new(40, 40)
        .with_pointer_image(pointer)
        .with_batch(vec![
            InputEvent::ButtonPress { x: 5, y: 5, child: None },
            InputEvent::ButtonRelease { x: 5, y: 5 },
        ]);
    let options = SelectionOptions {
        pointer: true,
        ..Default::default()
    };
    let mut selector = selector(&display, options);

    let capture = selector.select_mode().unwrap().unwrap();
    assert_eq!(capture.dimensions(), (40, 40));
    assert_eq!(capture.pixel(15, 15), Rgba([0, 255, 0, 255]));
    assert_eq!(capture.pixel(16, 15), MockDisplay::pixel_at(16, 15));
}

#[test]
fn test_pointer_not_recorded_after_drag_without_delay() {
    let pointer = PointerImage {
        x:      15,
        y:      15,
        width:  1,
        height: 1,
        xhot:   0,
        yhot:   0,
        pixels: vec![0xff00_ff00],
    };
    let display = MockDisplay::new(40, 40)
        .with_pointer_image(pointer)
        .with_batch(drag((0, 0), (30, 30)));
    let options = SelectionOptions {
        pointer: true,
        ..Default::default()
    };
    let mut selector = selector(&display, options);

    let capture = selector.select_mode().unwrap().unwrap();
    assert_eq!(capture.pixel(15, 15), MockDisplay::pixel_at(15, 15));
}

#[test]
fn test_capture_saved_as_png() {
    let display = MockDisplay::new(800, 600).with_batch(drag((10, 10), (50, 40)));
    let mut selector = selector(&display, SelectionOptions::default());
    let capture = selector.select_mode().unwrap().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("selection.png");
    save_image(&capture, &path, DEFAULT_QUALITY).unwrap();

    let saved = image::open(&path).unwrap().to_rgba8();
    assert_eq!(saved.dimensions(), (40, 30));
    assert_eq!(*saved.get_pixel(0, 0), MockDisplay::pixel_at(10, 10));
}

#[test]
fn test_drag_back_to_anchor_row_still_saves() {
    let display = MockDisplay::new(800, 600).with_batch(vec![
        InputEvent::ButtonPress { x: 10, y: 10, child: None },
        InputEvent::Motion { x: 50, y: 40 },
        InputEvent::ButtonRelease { x: 50, y: 10 },
    ]);
    let mut selector = selector(&display, SelectionOptions::default());
    let capture = selector.select_mode().unwrap().unwrap();
    assert_eq!(capture.dimensions(), (40, 1));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("row.png");
    save_image(&capture, &path, DEFAULT_QUALITY).unwrap();
    assert_eq!(image::open(&path).unwrap().to_rgba8().dimensions(), (40, 1));
}
