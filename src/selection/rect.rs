//! Rectangle arithmetic for the selection
//!
//! Pure functions: corner normalization, drag finishing with the
//! last-row/last-column correction, clipping to the screen and the
//! keyboard nudge of the anchor corner.

use crate::{
    display::{Keysym, keysym},
    model::{ScreenSize, SelectionRect},
};

/// Normalizes two corner points into a rectangle of at least 1x1
///
/// A zero delta becomes 1; a negative delta moves the origin by the delta
/// and keeps its magnitude as the extent.
///
/// # Examples
///
/// ```
/// use scrot_select::{model::SelectionRect, selection::rect::calculate_rect};
///
/// assert_eq!(calculate_rect(50, 40, 10, 10), SelectionRect::new(10, 10, 40, 30));
/// assert_eq!(calculate_rect(7, 7, 7, 7), SelectionRect::new(7, 7, 1, 1));
/// ```
pub fn calculate_rect(x0: i32, y0: i32, x1: i32, y1: i32) -> SelectionRect {
    let (x, w) = normalize_span(x0, x1 - x0);
    let (y, h) = normalize_span(y0, y1 - y0);
    SelectionRect::new(x, y, w, h)
}

/// Moves the origin for a negative extent and returns `(origin, |extent|)`
///
/// A zero extent becomes 1.
fn normalize_span(origin: i32, extent: i32) -> (i32, u32) {
    if extent == 0 {
        (origin, 1)
    } else if extent < 0 {
        (origin + extent, extent.unsigned_abs())
    } else {
        (origin, extent as u32)
    }
}

/// Final rectangle of a drag from `anchor` to the release point
///
/// A release on the last column (or row) of the screen extends the
/// rectangle by one so the edge pixel is included. A release on the
/// anchor's own row or column still yields an extent of 1.
pub fn finish_drag(anchor: (i32, i32), release: (i32, i32), screen: ScreenSize) -> SelectionRect {
    let mut w = release.0 - anchor.0;
    let mut h = release.1 - anchor.1;

    if release.0 + 1 == screen.width {
        w += 1;
    }
    if release.1 + 1 == screen.height {
        h += 1;
    }

    let (x, w) = normalize_span(anchor.0, w);
    let (y, h) = normalize_span(anchor.1, h);
    SelectionRect::new(x, y, w, h)
}

/// Clips a rectangle to the screen
///
/// A negative origin moves to 0 and shrinks the extent by the same amount;
/// an extent running past the screen edge is trimmed to it.
pub fn nice_clip(rect: SelectionRect, screen: ScreenSize) -> SelectionRect {
    let (mut x, mut y) = (rect.x, rect.y);
    let (mut w, mut h) = (rect.w as i32, rect.h as i32);

    if x < 0 {
        w += x;
        x = 0;
    }
    if y < 0 {
        h += y;
        y = 0;
    }
    if x + w > screen.width {
        w = screen.width - x;
    }
    if y + h > screen.height {
        h = screen.height - y;
    }

    SelectionRect::new(x, y, w.max(0) as u32, h.max(0) as u32)
}

/// Applies an arrow key to the anchor corner
///
/// Returns the moved anchor, clamped to `[0, screen dimension]`, or `None`
/// if `sym` is not an arrow key.
pub fn nudge(anchor: (i32, i32), sym: Keysym, screen: ScreenSize) -> Option<(i32, i32)> {
    let (x, y) = anchor;
    let moved = match sym {
        keysym::RIGHT => ((x + 1).min(screen.width), y),
        keysym::LEFT => ((x - 1).max(0), y),
        keysym::DOWN => (x, (y + 1).min(screen.height)),
        keysym::UP => (x, (y - 1).max(0)),
        _ => return None,
    };
    Some(moved)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: ScreenSize = ScreenSize {
        width:  800,
        height: 600,
    };

    #[test]
    fn test_calculate_rect_forward_drag() {
        assert_eq!(calculate_rect(10, 10, 50, 40), SelectionRect::new(10, 10, 40, 30));
    }

    #[test]
    fn test_calculate_rect_backward_drag() {
        assert_eq!(calculate_rect(50, 40, 10, 10), SelectionRect::new(10, 10, 40, 30));
        assert_eq!(calculate_rect(50, 10, 10, 40), SelectionRect::new(10, 10, 40, 30));
    }

    #[test]
    fn test_calculate_rect_zero_size_forced_to_one() {
        assert_eq!(calculate_rect(100, 100, 100, 100), SelectionRect::new(100, 100, 1, 1));
        assert_eq!(calculate_rect(5, 5, 5, 9), SelectionRect::new(5, 5, 1, 4));
    }

    #[test]
    fn test_calculate_rect_bounds_both_points() {
        let points = [-20, -1, 0, 1, 3, 17, 640];
        for &x0 in &points {
            for &y0 in &points {
                for &x1 in &points {
                    for &y1 in &points {
                        let rect = calculate_rect(x0, y0, x1, y1);
                        assert!(rect.w >= 1 && rect.h >= 1);
                        assert_eq!(rect.x, x0.min(x1));
                        assert_eq!(rect.y, y0.min(y1));
                        if x0 != x1 {
                            assert_eq!(rect.right(), x0.max(x1));
                        }
                        if y0 != y1 {
                            assert_eq!(rect.bottom(), y0.max(y1));
                        }
                        assert_eq!(rect, calculate_rect(x1, y1, x0, y0));
                    }
                }
            }
        }
    }

    #[test]
    fn test_finish_drag_plain() {
        assert_eq!(finish_drag((10, 10), (50, 40), SCREEN), SelectionRect::new(10, 10, 40, 30));
    }

    #[test]
    fn test_finish_drag_includes_last_column_and_row() {
        let rect = finish_drag((700, 500), (799, 599), SCREEN);
        assert_eq!(rect, SelectionRect::new(700, 500, 100, 100));
    }

    #[test]
    fn test_finish_drag_back_to_anchor_row_or_column() {
        assert_eq!(finish_drag((10, 10), (50, 10), SCREEN), SelectionRect::new(10, 10, 40, 1));
        assert_eq!(finish_drag((10, 10), (10, 40), SCREEN), SelectionRect::new(10, 10, 1, 30));
    }

    #[test]
    fn test_finish_drag_backwards() {
        let rect = finish_drag((60, 70), (20, 30), SCREEN);
        assert_eq!(rect, SelectionRect::new(20, 30, 40, 40));
    }

    #[test]
    fn test_nice_clip_inside_is_identity() {
        let rect = SelectionRect::new(10, 10, 40, 30);
        assert_eq!(nice_clip(rect, SCREEN), rect);
    }

    #[test]
    fn test_nice_clip_trims_all_edges() {
        assert_eq!(
            nice_clip(SelectionRect::new(-10, -5, 50, 50), SCREEN),
            SelectionRect::new(0, 0, 40, 45)
        );
        assert_eq!(
            nice_clip(SelectionRect::new(780, 590, 50, 50), SCREEN),
            SelectionRect::new(780, 590, 20, 10)
        );
    }

    #[test]
    fn test_nudge_moves_and_clamps() {
        assert_eq!(nudge((5, 5), keysym::RIGHT, SCREEN), Some((6, 5)));
        assert_eq!(nudge((5, 5), keysym::LEFT, SCREEN), Some((4, 5)));
        assert_eq!(nudge((5, 5), keysym::DOWN, SCREEN), Some((5, 6)));
        assert_eq!(nudge((5, 5), keysym::UP, SCREEN), Some((5, 4)));

        assert_eq!(nudge((0, 0), keysym::LEFT, SCREEN), Some((0, 0)));
        assert_eq!(nudge((0, 0), keysym::UP, SCREEN), Some((0, 0)));
        assert_eq!(nudge((800, 600), keysym::RIGHT, SCREEN), Some((800, 600)));
        assert_eq!(nudge((800, 600), keysym::DOWN, SCREEN), Some((800, 600)));
    }

    #[test]
    fn test_nudge_ignores_other_keys() {
        assert_eq!(nudge((5, 5), keysym::ESCAPE, SCREEN), None);
        assert_eq!(nudge((5, 5), 0x61, SCREEN), None);
    }
}
