//! Two-pass selection for the composite modes
//!
//! Pass one always selects the capture area. In hide and hole mode a second
//! pass selects the inner area, which is then covered (hide) or kept while
//! everything around it is covered (hole) with the line colour at the line
//! opacity.

use super::{GrabRetry, event_loop, outline::resolve_line_color};
use crate::{
    capture::ImageBuffer,
    display::{ScreenSource, SelectionDisplay},
    error::SelectionResult,
    model::{SelectionMode, SelectionOptions, SelectionRect},
    util::delay::apply_delay,
};

/// Runs the selection passes for `options.mode` and grabs the result
///
/// Returns `Ok(None)` if either pass is aborted.
pub fn select_mode<D: SelectionDisplay + ScreenSource + ?Sized>(
    display: &D,
    options: &mut SelectionOptions,
    retry: &GrabRetry,
) -> SelectionResult<Option<ImageBuffer>> {
    let mode = options.mode;

    options.mode = SelectionMode::Capture;
    let outer = event_loop::run(display, options, retry);
    options.mode = mode;
    let Some(outer) = outer? else {
        return Ok(None);
    };

    let inner = if mode.is_composite() {
        tracing::info!("Select the area to {}", if mode == SelectionMode::Hole { "keep" } else { "hide" });
        match event_loop::run(display, options, retry)? {
            Some(rect) => Some(rect),
            None => return Ok(None),
        }
    } else {
        None
    };

    apply_delay(options.delay, options.countdown);

    let mut capture = ImageBuffer::new(display.grab_region(outer)?);

    if options.pointer {
        match display.pointer_image()? {
            Some(pointer) => capture.composite_pointer(&pointer, (outer.x, outer.y)),
            None => tracing::debug!("Pointer image unavailable, not recording the pointer"),
        }
    }

    if let Some(inner) = inner {
        let color = resolve_line_color(display, &options.line)?;
        let rgb = color.rgb8();
        let alpha = options.line.opacity;
        let relative = SelectionRect::new(inner.x - outer.x, inner.y - outer.y, inner.w, inner.h);

        match mode {
            SelectionMode::Hole => capture.punch_hole(relative, rgb, alpha),
            SelectionMode::Hide => capture.hide(relative, rgb, alpha),
            SelectionMode::Capture => {}
        }
    }

    Ok(Some(capture))
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::display::{InputEvent, MockDisplay, mock::DisplayCall};

    fn drag(from: (i32, i32), to: (i32, i32)) -> Vec<InputEvent> {
        vec![
            InputEvent::ButtonPress { x: from.0, y: from.1, child: None },
            InputEvent::Motion { x: to.0, y: to.1 },
            InputEvent::ButtonRelease { x: to.0, y: to.1 },
        ]
    }

    #[test]
    fn test_capture_mode_is_single_pass() {
        let display = MockDisplay::new(800, 600).with_batch(drag((10, 10), (50, 40)));
        let mut options = SelectionOptions::default();

        let capture = select_mode(&display, &mut options, &GrabRetry::immediate(20))
            .unwrap()
            .unwrap();
        assert_eq!(capture.dimensions(), (40, 30));
        assert_eq!(capture.pixel(0, 0), MockDisplay::pixel_at(10, 10));
        assert_eq!(display.count(|c| *c == DisplayCall::GrabKeyboard), 1);
    }

    #[test]
    fn test_hide_mode_restores_mode_and_fills_inner() {
        let display = MockDisplay::new(800, 600)
            .with_batch(drag((0, 0), (200, 200)))
            .with_batch(drag((50, 50), (100, 100)));
        let mut options = SelectionOptions {
            mode: SelectionMode::Hide,
            ..Default::default()
        };
        options.line.opacity = 255;

        let capture = select_mode(&display, &mut options, &GrabRetry::immediate(20))
            .unwrap()
            .unwrap();
        assert_eq!(options.mode, SelectionMode::Hide);
        assert_eq!(capture.pixel(60, 60), Rgba([0xbe, 0xbe, 0xbe, 255]));
        assert_eq!(capture.pixel(10, 10), MockDisplay::pixel_at(10, 10));
    }

    #[test]
    fn test_abort_in_second_pass() {
        let display = MockDisplay::new(800, 600)
            .with_batch(drag((0, 0), (200, 200)))
            .with_batch(vec![InputEvent::KeyPress {
                keycode: crate::display::mock::keycode::ESCAPE,
                x:       0,
                y:       0,
            }]);
        let mut options = SelectionOptions {
            mode: SelectionMode::Hole,
            ..Default::default()
        };

        let result = select_mode(&display, &mut options, &GrabRetry::immediate(20)).unwrap();
        assert!(result.is_none());
        assert_eq!(display.count(|c| matches!(c, DisplayCall::GrabRegion(_))), 0);
        assert_eq!(options.mode, SelectionMode::Hole);
    }
}
