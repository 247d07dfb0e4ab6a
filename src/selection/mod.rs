//! Interactive region selection
//!
//! [`Selector`] is the entry point. It runs one blocking, modal selection
//! against a [`SelectionDisplay`]:
//!
//! 1. a [`session::Session`] creates the cursors and the outline, and grabs
//!    the pointer
//! 2. [`event_loop::run`] grabs the keyboard and tracks input until the
//!    button is released or a key aborts
//! 3. the session is torn down and the rectangle (drag) or the window
//!    geometry (click) is clipped to the screen
//!
//! [`Selector::select_mode`] adds the second pass and the compositing of the
//! hide and hole modes.

use std::time::Duration;

use crate::{
    capture::ImageBuffer,
    display::{ScreenSource, SelectionDisplay},
    error::SelectionResult,
    model::{SelectionOptions, SelectionRect},
};

pub mod cursors;
pub mod event_loop;
pub mod mode;
pub mod outline;
pub mod rect;
pub mod session;

/// Retry policy for a keyboard grab held by another client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabRetry {
    /// Retries after the first attempt
    pub attempts: u32,
    /// Pause before each retry
    pub interval: Duration,
}

impl GrabRetry {
    /// Retries without pausing
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            interval: Duration::ZERO,
        }
    }
}

impl Default for GrabRetry {
    fn default() -> Self {
        Self {
            attempts: 20,
            interval: Duration::from_millis(50),
        }
    }
}

/// Runs selections on one display
pub struct Selector<'d, D: SelectionDisplay + ?Sized> {
    display:        &'d D,
    options:        SelectionOptions,
    keyboard_retry: GrabRetry,
}

impl<'d, D: SelectionDisplay + ?Sized> Selector<'d, D> {
    pub fn new(display: &'d D, options: SelectionOptions) -> Self {
        Self {
            display,
            options,
            keyboard_retry: GrabRetry::default(),
        }
    }

    /// Replaces the keyboard grab retry policy
    pub fn with_keyboard_retry(mut self, retry: GrabRetry) -> Self {
        self.keyboard_retry = retry;
        self
    }

    /// Current options
    ///
    /// A drag finished without a delay turns `pointer` off, so callers
    /// that record the pointer should read it back after a selection.
    pub fn options(&self) -> &SelectionOptions {
        &self.options
    }

    /// Lets the user drag a rectangle or click a window
    ///
    /// Returns `Ok(None)` when the selection was aborted from the keyboard
    /// or the clicked window has no resolvable geometry.
    ///
    /// # Errors
    ///
    /// Grab failures, a lost connection and an unknown line colour are
    /// returned after every grab and server resource has been released.
    pub fn get_user_selection(&mut self) -> SelectionResult<Option<SelectionRect>> {
        event_loop::run(self.display, &mut self.options, &self.keyboard_retry)
    }
}

impl<D: SelectionDisplay + ScreenSource + ?Sized> Selector<'_, D> {
    /// Runs the selection passes of the configured mode and grabs the image
    ///
    /// Returns `Ok(None)` if any pass was aborted.
    pub fn select_mode(&mut self) -> SelectionResult<Option<ImageBuffer>> {
        mode::select_mode(self.display, &mut self.options, &self.keyboard_retry)
    }
}
