//! scrot-select: interactive X11 region selection for screenshot capture
//!
//! The user drags a rectangle or clicks a window while the library shows
//! live feedback (mode cursor, outline, corner cursors) under exclusive
//! pointer and keyboard grabs. Every grab, cursor and outline resource is
//! released on every exit path, including errors.
//!
//! The X server is reached through the [`display::SelectionDisplay`] and
//! [`display::ScreenSource`] traits; `display::X11Display` implements them
//! with x11rb and [`display::MockDisplay`] replays scripted input.

pub mod capture;
pub mod display;
pub mod error;
pub mod model;
pub mod selection;
pub mod util;

pub use error::{SelectionError, SelectionResult};
pub use model::{SelectionOptions, SelectionRect};
pub use selection::{GrabRetry, Selector};
