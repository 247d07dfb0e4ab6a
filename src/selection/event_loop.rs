//! Input state machine for one selection pass
//!
//! Drains every queued event, then blocks on connection readiness until the
//! state becomes terminal. The keyboard is grabbed for the whole pass so
//! arrow keys and Escape reach the loop regardless of focus.

use std::{io, thread};

use super::{
    GrabRetry,
    rect::{finish_drag, nice_clip, nudge},
    session::Session,
};
use crate::{
    display::{GrabOutcome, InputEvent, Keysym, SelectionDisplay, WindowId, keysym},
    error::{SelectionError, SelectionResult},
    model::{SelectionOptions, SelectionRect},
};

/// A live rectangle wider than this many pixels counts as a drag
const DRAG_MIN_WIDTH: u32 = 5;

/// State of the selection loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No button pressed yet
    WaitingButton,
    /// Button pressed, tracking motion
    Dragging,
    /// Button released
    Complete,
    /// Aborted from the keyboard
    Aborted,
}

impl LoopState {
    fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Complete | LoopState::Aborted)
    }
}

/// Whether a key press aborts the selection
///
/// Any key aborts unless keyboard input is ignored, in which case only
/// Escape does.
///
/// # Examples
///
/// ```
/// use scrot_select::{display::keysym, selection::event_loop::is_abort_key};
///
/// assert!(is_abort_key(0x61, false));
/// assert!(!is_abort_key(0x61, true));
/// assert!(is_abort_key(keysym::ESCAPE, true));
/// ```
pub fn is_abort_key(sym: Keysym, ignore_keyboard: bool) -> bool {
    !ignore_keyboard || sym == keysym::ESCAPE
}

/// Releases the keyboard grab when dropped
struct KeyboardGrab<'d, D: SelectionDisplay + ?Sized> {
    display: &'d D,
}

impl<'d, D: SelectionDisplay + ?Sized> KeyboardGrab<'d, D> {
    /// Grabs the keyboard, retrying while another client holds it
    fn acquire(display: &'d D, retry: &GrabRetry) -> SelectionResult<Self> {
        let mut outcome = display.grab_keyboard()?;
        let mut retries = 0;
        while outcome == GrabOutcome::AlreadyGrabbed && retries < retry.attempts {
            if !retry.interval.is_zero() {
                thread::sleep(retry.interval);
            }
            retries += 1;
            outcome = display.grab_keyboard()?;
        }

        if outcome != GrabOutcome::Success {
            tracing::error!("Keyboard grab failed after {} retries: {:?}", retries, outcome);
            return Err(SelectionError::KeyboardGrab { attempts: retries + 1 });
        }
        if retries > 0 {
            tracing::debug!("Keyboard grabbed after {} retries", retries);
        }
        Ok(Self { display })
    }
}

impl<D: SelectionDisplay + ?Sized> Drop for KeyboardGrab<'_, D> {
    fn drop(&mut self) {
        self.display.ungrab_keyboard();
    }
}

/// Loop bookkeeping between events
struct Tracker<'o> {
    state:   LoopState,
    anchor:  (i32, i32),
    release: (i32, i32),
    target:  Option<WindowId>,
    options: &'o SelectionOptions,
}

impl Tracker<'_> {
    fn handle<D: SelectionDisplay + ?Sized>(
        &mut self,
        display: &D,
        session: &mut Session<'_, D>,
        event: InputEvent,
    ) -> SelectionResult<()> {
        match event {
            InputEvent::Motion { x, y } => {
                if self.state == LoopState::Dragging {
                    session.motion_draw(self.anchor.0, self.anchor.1, x, y);
                }
            }
            InputEvent::ButtonPress { x, y, child } => {
                self.anchor = (x, y);
                self.target = Some(display.window_at(child, x, y)?.unwrap_or_else(|| display.root()));
                self.state = LoopState::Dragging;
                tracing::debug!("Button pressed at {},{}", x, y);
            }
            InputEvent::ButtonRelease { x, y } => {
                self.release = (x, y);
                self.state = LoopState::Complete;
                tracing::debug!("Button released at {},{}", x, y);
            }
            InputEvent::KeyPress { keycode, x, y } => {
                let Some(sym) = display.keysym(keycode)? else {
                    return Ok(());
                };
                if self.state == LoopState::Dragging {
                    if let Some(anchor) = nudge(self.anchor, sym, display.screen_size()) {
                        self.anchor = anchor;
                        session.motion_draw(anchor.0, anchor.1, x, y);
                        return Ok(());
                    }
                }
                if is_abort_key(sym, self.options.ignore_keyboard) {
                    tracing::warn!("Key was pressed, aborting shot");
                    self.state = LoopState::Aborted;
                }
            }
            InputEvent::KeyRelease | InputEvent::Other => {}
        }
        Ok(())
    }
}

/// Classifies a failed readiness wait
///
/// Out of memory, an invalid argument and a bad descriptor mean the
/// connection is gone; anything else (an interrupted wait) is retried.
fn check_wait(result: io::Result<()>) -> SelectionResult<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) => match e.raw_os_error() {
            Some(libc::ENOMEM | libc::EINVAL | libc::EBADF) => {
                tracing::error!("Connection to X display lost: {}", e);
                Err(SelectionError::ConnectionLost { source: e })
            }
            _ => {
                tracing::warn!("Ignoring failed wait on the X connection: {}", e);
                Ok(())
            }
        },
    }
}

/// Runs one selection pass
///
/// Returns `Ok(None)` when the user aborted or clicked a window whose
/// geometry cannot be resolved. A drag with `delay == 0` turns pointer
/// recording off in `options`.
pub fn run<D: SelectionDisplay + ?Sized>(
    display: &D,
    options: &mut SelectionOptions,
    retry: &GrabRetry,
) -> SelectionResult<Option<SelectionRect>> {
    let mut session = Session::create(display, options)?;
    let keyboard = KeyboardGrab::acquire(display, retry)?;

    let mut tracker = Tracker {
        state: LoopState::WaitingButton,
        anchor: (0, 0),
        release: (0, 0),
        target: None,
        options,
    };

    loop {
        while !tracker.state.is_terminal() {
            let Some(event) = display.poll_event()? else { break };
            tracker.handle(display, &mut session, event)?;
        }
        if tracker.state.is_terminal() {
            break;
        }
        check_wait(display.wait_readable())?;
    }

    session.draw();
    drop(keyboard);
    let is_drag = session.rect().is_some_and(|rect| rect.w > DRAG_MIN_WIDTH);
    session.destroy();

    let Tracker {
        state,
        anchor,
        release,
        target,
        ..
    } = tracker;
    if state == LoopState::Aborted {
        return Ok(None);
    }

    let screen = display.screen_size();
    let rect = if is_drag {
        if options.delay == 0 {
            options.pointer = false;
        }
        finish_drag(anchor, release, screen)
    } else {
        let Some(target) = target else {
            tracing::debug!("Button released without a press");
            return Ok(None);
        };
        match display.window_geometry(target, options.border)? {
            Some(geometry) => geometry,
            None => {
                tracing::warn!("Could not resolve the geometry of window {:#x}", target);
                return Ok(None);
            }
        }
    };

    let rect = nice_clip(rect, screen);
    if !options.silent {
        display.bell();
    }
    tracing::info!("Selected {}", rect);
    Ok(Some(rect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{
        MockDisplay,
        mock::{DisplayCall, keycode},
    };

    fn no_wait() -> GrabRetry {
        GrabRetry::immediate(20)
    }

    #[test]
    fn test_is_abort_key() {
        assert!(is_abort_key(keysym::ESCAPE, false));
        assert!(is_abort_key(keysym::ESCAPE, true));
        assert!(is_abort_key(0x61, false));
        assert!(!is_abort_key(0x61, true));
    }

    #[test]
    fn test_check_wait_classification() {
        assert!(check_wait(Ok(())).is_ok());
        assert!(check_wait(Err(io::Error::from_raw_os_error(libc::EINTR))).is_ok());
        assert!(check_wait(Err(io::Error::from_raw_os_error(libc::EAGAIN))).is_ok());
        for errno in [libc::ENOMEM, libc::EINVAL, libc::EBADF] {
            let result = check_wait(Err(io::Error::from_raw_os_error(errno)));
            assert!(matches!(result, Err(SelectionError::ConnectionLost { .. })));
        }
    }

    #[test]
    fn test_drag_selection() {
        let display = MockDisplay::new(800, 600).with_batch(vec![
            InputEvent::ButtonPress { x: 10, y: 10, child: None },
            InputEvent::Motion { x: 50, y: 40 },
            InputEvent::ButtonRelease { x: 50, y: 40 },
        ]);
        let mut options = SelectionOptions::default();

        let rect = run(&display, &mut options, &no_wait()).unwrap();
        assert_eq!(rect, Some(SelectionRect::new(10, 10, 40, 30)));
        assert_eq!(display.count(|c| *c == DisplayCall::Bell), 1);
    }

    #[test]
    fn test_motion_before_press_is_ignored() {
        let display = MockDisplay::new(800, 600).with_batch(vec![
            InputEvent::Motion { x: 50, y: 40 },
            InputEvent::ButtonPress { x: 10, y: 10, child: None },
            InputEvent::ButtonRelease { x: 10, y: 10 },
        ]);
        let mut options = SelectionOptions::default();

        let rect = run(&display, &mut options, &no_wait()).unwrap();
        assert_eq!(display.count(|c| matches!(c, DisplayCall::DrawRectangle(..))), 0);
        // A click on the root window selects the whole screen
        assert_eq!(rect, Some(SelectionRect::new(0, 0, 800, 600)));
    }

    #[test]
    fn test_keyboard_grab_retries_then_fails() {
        let display = MockDisplay::new(100, 100).with_keyboard_grabs([GrabOutcome::AlreadyGrabbed; 21]);
        let mut options = SelectionOptions::default();

        let result = run(&display, &mut options, &no_wait());
        assert!(matches!(result, Err(SelectionError::KeyboardGrab { attempts: 21 })));
        assert_eq!(display.count(|c| *c == DisplayCall::GrabKeyboard), 21);
        assert_eq!(display.count(|c| *c == DisplayCall::UngrabKeyboard), 0);
        assert_eq!(display.count(|c| *c == DisplayCall::UngrabPointer), 1);
    }

    #[test]
    fn test_keyboard_grab_refused_is_not_retried() {
        let display = MockDisplay::new(100, 100).with_keyboard_grabs([GrabOutcome::Refused]);
        let mut options = SelectionOptions::default();

        let result = run(&display, &mut options, &no_wait());
        assert!(matches!(result, Err(SelectionError::KeyboardGrab { attempts: 1 })));
        assert_eq!(display.count(|c| *c == DisplayCall::GrabKeyboard), 1);
    }

    #[test]
    fn test_escape_before_press_aborts() {
        let display = MockDisplay::new(100, 100).with_batch(vec![InputEvent::KeyPress {
            keycode: keycode::ESCAPE,
            x:       0,
            y:       0,
        }]);
        let mut options = SelectionOptions::default();

        assert_eq!(run(&display, &mut options, &no_wait()).unwrap(), None);
        assert_eq!(display.count(|c| *c == DisplayCall::Bell), 0);
        assert_eq!(display.count(|c| *c == DisplayCall::UngrabKeyboard), 1);
    }

    #[test]
    fn test_unbound_keycode_is_skipped() {
        let display = MockDisplay::new(100, 100).with_batch(vec![
            InputEvent::KeyPress {
                keycode: keycode::UNBOUND,
                x:       0,
                y:       0,
            },
            InputEvent::ButtonPress { x: 1, y: 1, child: None },
            InputEvent::ButtonRelease { x: 1, y: 1 },
        ]);
        let mut options = SelectionOptions::default();

        assert!(run(&display, &mut options, &no_wait()).unwrap().is_some());
    }

    #[test]
    fn test_connection_lost_tears_down() {
        let display = MockDisplay::new(100, 100).with_wait_error(libc::ENOMEM);
        let mut options = SelectionOptions::default();

        let result = run(&display, &mut options, &no_wait());
        assert!(matches!(result, Err(SelectionError::ConnectionLost { .. })));
        assert_eq!(display.count(|c| *c == DisplayCall::UngrabKeyboard), 1);
        assert_eq!(display.count(|c| *c == DisplayCall::UngrabPointer), 1);
        assert_eq!(display.count(|c| matches!(c, DisplayCall::FreeCursor(_))), 5);
    }
}
