//! Selection session: cursors, outline and the pointer grab
//!
//! A [`Session`] owns everything acquired for one interaction. Creating it
//! acquires, in order, the cursor set, the outline backend and the pointer
//! grab. Dropping it releases them in the order the X server needs: ungrab
//! the pointer, free the cursors, sync while discarding queued events, then
//! destroy the outline.
//!
//! Because the session holds the exclusive pointer grab, at most one can be
//! live per display; a second grab attempt while one exists would fail.

use super::{
    cursors::{Corner, CursorSet},
    outline::{Outline, OutlineStrategy},
    rect::calculate_rect,
};
use crate::{
    display::{GrabOutcome, PointerEvents, SelectionDisplay},
    error::{SelectionError, SelectionResult},
    model::{SelectionOptions, SelectionRect},
};

/// Releases the pointer grab when dropped
struct PointerGrab<'d, D: SelectionDisplay + ?Sized> {
    display: &'d D,
}

impl<D: SelectionDisplay + ?Sized> Drop for PointerGrab<'_, D> {
    fn drop(&mut self) {
        self.display.ungrab_pointer();
    }
}

/// One live selection interaction
pub struct Session<'d, D: SelectionDisplay + ?Sized> {
    display: &'d D,
    grab:    Option<PointerGrab<'d, D>>,
    cursors: Option<CursorSet<'d, D>>,
    outline: Option<Outline<'d, D>>,
    rect:    Option<SelectionRect>,
}

impl<'d, D: SelectionDisplay + ?Sized> Session<'d, D> {
    /// Creates cursors and outline, then grabs the pointer
    ///
    /// # Errors
    ///
    /// - [`SelectionError::PointerGrab`] - another client holds the pointer
    /// - [`SelectionError::ColorAllocation`] - unknown line colour
    /// - [`SelectionError::Request`] - a resource could not be created
    ///
    /// Everything acquired before the failure is released before returning.
    pub fn create(display: &'d D, options: &SelectionOptions) -> SelectionResult<Self> {
        let mut session = Self {
            display,
            grab: None,
            cursors: Some(CursorSet::create(display, options.mode)?),
            outline: None,
            rect: None,
        };
        session.outline = Some(Outline::create(display, &options.line)?);

        let main_cursor = session.cursors.as_ref().map(CursorSet::main).unwrap_or_default();
        match display.grab_pointer(main_cursor)? {
            GrabOutcome::Success => {
                session.grab = Some(PointerGrab { display });
            }
            outcome => {
                tracing::error!("Pointer grab failed: {:?}", outcome);
                return Err(SelectionError::PointerGrab);
            }
        }

        tracing::debug!("Selection session started ({} mode)", options.mode);
        Ok(session)
    }

    /// Rectangle last rendered by [`motion_draw`](Self::motion_draw)
    pub fn rect(&self) -> Option<SelectionRect> {
        self.rect
    }

    /// Final render once the drag ended
    pub fn draw(&mut self) {
        let last = self.rect;
        if let Some(outline) = self.outline.as_mut() {
            outline.draw(last);
        }
    }

    /// Renders the rectangle from `(x0, y0)` to `(x1, y1)`
    ///
    /// Switches the grab cursor to the angle matching the drag direction
    /// and updates the live rectangle.
    pub fn motion_draw(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        if let Some(cursors) = self.cursors.as_ref() {
            let cursor = cursors.corner(Corner::of_drag(x0, y0, x1, y1));
            if let Err(e) = self.display.change_pointer_grab(cursor, PointerEvents::MotionRelease) {
                tracing::warn!("Failed to change grab cursor: {}", e);
            }
        }

        let previous = self.rect;
        let current = calculate_rect(x0, y0, x1, y1);
        if let Some(outline) = self.outline.as_mut() {
            outline.motion_draw(previous, current);
        }
        self.rect = Some(current);
    }

    /// Ends the session, releasing every resource
    pub fn destroy(self) {}
}

impl<D: SelectionDisplay + ?Sized> Drop for Session<'_, D> {
    fn drop(&mut self) {
        drop(self.grab.take());
        drop(self.cursors.take());
        self.display.sync_discard();
        if let Some(mut outline) = self.outline.take() {
            outline.destroy();
        }
        tracing::debug!("Selection session ended");
    }
}
