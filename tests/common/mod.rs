//! Shared test utilities for integration tests

#![allow(dead_code)]

use scrot_select::{
    GrabRetry, Selector,
    display::{InputEvent, MockDisplay, WindowId},
    model::SelectionOptions,
};

/// Press, move and release between two points
pub fn drag(from: (i32, i32), to: (i32, i32)) -> Vec<InputEvent> {
    vec![
        InputEvent::ButtonPress {
            x:     from.0,
            y:     from.1,
            child: None,
        },
        InputEvent::Motion { x: to.0, y: to.1 },
        InputEvent::ButtonRelease { x: to.0, y: to.1 },
    ]
}

/// Press and release on a window without moving
pub fn click(at: (i32, i32), child: Option<WindowId>) -> Vec<InputEvent> {
    vec![
        InputEvent::ButtonPress {
            x: at.0,
            y: at.1,
            child,
        },
        InputEvent::ButtonRelease { x: at.0, y: at.1 },
    ]
}

/// Key press with the pointer at the origin
pub fn key(keycode: u8) -> InputEvent {
    key_at(keycode, (0, 0))
}

/// Key press with the pointer at `at`
pub fn key_at(keycode: u8, at: (i32, i32)) -> InputEvent {
    InputEvent::KeyPress {
        keycode,
        x: at.0,
        y: at.1,
    }
}

/// Selector that retries the keyboard grab without sleeping
pub fn selector(display: &MockDisplay, options: SelectionOptions) -> Selector<'_, MockDisplay> {
    Selector::new(display, options).with_keyboard_retry(GrabRetry::immediate(20))
}
