//! Scripted display for testing
//!
//! `MockDisplay` implements [`SelectionDisplay`] and [`ScreenSource`] without
//! an X server. Input arrives as scripted batches: the event loop drains the
//! current batch, and each readiness wait releases the next one. When the
//! script runs out, the wait fails with `EBADF` just like a closed
//! connection, so a test that forgets to finish its interaction fails
//! instead of hanging.
//!
//! Every request is recorded as a [`DisplayCall`] so tests can check that
//! grabs, cursors and outline resources are paired.
//!
//! # Examples
//!
//! ```
//! use scrot_select::{
//!     display::{InputEvent, MockDisplay},
//!     model::SelectionOptions,
//!     selection::Selector,
//! };
//!
//! let display = MockDisplay::new(800, 600).with_batch(vec![
//!     InputEvent::ButtonPress { x: 10, y: 10, child: None },
//!     InputEvent::Motion { x: 50, y: 40 },
//!     InputEvent::ButtonRelease { x: 50, y: 40 },
//! ]);
//!
//! let mut selector = Selector::new(&display, SelectionOptions::default());
//! let rect = selector.get_user_selection().unwrap().unwrap();
//! assert_eq!((rect.x, rect.y, rect.w, rect.h), (10, 10, 40, 30));
//! ```

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
};

use super::{
    CursorId, CursorShape, GcId, GrabOutcome, InputEvent, Keysym, NamedColor, PointerEvents,
    PointerImage, ScreenSource, SelectionDisplay, WindowId, keysym,
};
use crate::{
    error::{SelectionError, SelectionResult},
    model::{LineOptions, ScreenSize, SelectionRect},
};

/// Keycodes of the default mock keymap (evdev numbering)
pub mod keycode {
    /// Escape
    pub const ESCAPE: u8 = 9;
    /// The `a` key
    pub const A: u8 = 38;
    /// Up arrow
    pub const UP: u8 = 111;
    /// Left arrow
    pub const LEFT: u8 = 113;
    /// Right arrow
    pub const RIGHT: u8 = 114;
    /// Down arrow
    pub const DOWN: u8 = 116;
    /// A keycode with no keysym bound
    pub const UNBOUND: u8 = 250;
}

/// Root window id of every mock display
pub const MOCK_ROOT: WindowId = 1;

/// A request recorded by [`MockDisplay`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    CreateCursor(CursorShape, CursorId),
    FreeCursor(CursorId),
    GrabPointer(CursorId),
    ChangePointerGrab(CursorId, PointerEvents),
    UngrabPointer,
    GrabKeyboard,
    UngrabKeyboard,
    SyncDiscard,
    Bell,
    AllocColor(String),
    CreateXorGc(GcId),
    DrawRectangle(GcId, SelectionRect),
    FreeGc(GcId),
    CreateFrame(WindowId),
    ShowFrame(WindowId, SelectionRect),
    DestroyFrame(WindowId),
    GrabRegion(SelectionRect),
}

#[derive(Debug)]
enum ScriptStep {
    Batch(Vec<InputEvent>),
    WaitError(i32),
}

/// Scripted display server
#[derive(Debug)]
pub struct MockDisplay {
    screen:          ScreenSize,
    queue:           RefCell<VecDeque<InputEvent>>,
    script:          RefCell<VecDeque<ScriptStep>>,
    pointer_grab:    GrabOutcome,
    keyboard_grabs:  RefCell<VecDeque<GrabOutcome>>,
    keymap:          HashMap<u8, Keysym>,
    windows:         HashMap<WindowId, SelectionRect>,
    colors:          HashMap<String, NamedColor>,
    cursor_limit:    Option<usize>,
    pointer_image:   Option<PointerImage>,
    next_id:         Cell<u32>,
    cursors_created: Cell<usize>,
    calls:           RefCell<Vec<DisplayCall>>,
}

impl MockDisplay {
    /// Creates a mock screen of the given size with no scripted input
    pub fn new(width: i32, height: i32) -> Self {
        let keymap = HashMap::from([
            (keycode::ESCAPE, keysym::ESCAPE),
            (keycode::A, 0x61),
            (keycode::UP, keysym::UP),
            (keycode::LEFT, keysym::LEFT),
            (keycode::RIGHT, keysym::RIGHT),
            (keycode::DOWN, keysym::DOWN),
        ]);
        let colors = [
            ("gray", 0xbebe, 0xbebe, 0xbebe),
            ("red", 0xffff, 0x0000, 0x0000),
            ("black", 0x0000, 0x0000, 0x0000),
            ("white", 0xffff, 0xffff, 0xffff),
        ]
        .into_iter()
        .map(|(name, red, green, blue)| {
            let pixel = (u32::from(red >> 8) << 16) | (u32::from(green >> 8) << 8) | u32::from(blue >> 8);
            (name.to_string(), NamedColor { pixel, red, green, blue })
        })
        .collect();

        Self {
            screen: ScreenSize::new(width, height),
            queue: RefCell::new(VecDeque::new()),
            script: RefCell::new(VecDeque::new()),
            pointer_grab: GrabOutcome::Success,
            keyboard_grabs: RefCell::new(VecDeque::new()),
            keymap,
            windows: HashMap::new(),
            colors,
            cursor_limit: None,
            pointer_image: None,
            next_id: Cell::new(0x100),
            cursors_created: Cell::new(0),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Appends a batch of events delivered after the next readiness wait
    pub fn with_batch(self, events: Vec<InputEvent>) -> Self {
        self.script.borrow_mut().push_back(ScriptStep::Batch(events));
        self
    }

    /// Appends a failing readiness wait with the given errno
    pub fn with_wait_error(self, errno: i32) -> Self {
        self.script.borrow_mut().push_back(ScriptStep::WaitError(errno));
        self
    }

    /// Sets the outcome of every pointer grab
    pub fn with_pointer_grab(mut self, outcome: GrabOutcome) -> Self {
        self.pointer_grab = outcome;
        self
    }

    /// Queues keyboard grab outcomes; grabs succeed once they run out
    pub fn with_keyboard_grabs(self, outcomes: impl IntoIterator<Item = GrabOutcome>) -> Self {
        self.keyboard_grabs.borrow_mut().extend(outcomes);
        self
    }

    /// Registers a viewable window and its root-relative geometry
    pub fn with_window(mut self, window: WindowId, geometry: SelectionRect) -> Self {
        self.windows.insert(window, geometry);
        self
    }

    /// Makes cursor creation fail once `limit` cursors exist
    pub fn with_cursor_limit(mut self, limit: usize) -> Self {
        self.cursor_limit = Some(limit);
        self
    }

    /// Sets the pointer image returned by [`ScreenSource::pointer_image`]
    pub fn with_pointer_image(mut self, image: PointerImage) -> Self {
        self.pointer_image = Some(image);
        self
    }

    /// Every request made so far, in order
    pub fn calls(&self) -> Vec<DisplayCall> {
        self.calls.borrow().clone()
    }

    /// Number of recorded requests matching a predicate
    pub fn count(&self, predicate: impl Fn(&DisplayCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(call)).count()
    }

    /// Pixel the mock screen shows at a root coordinate
    pub fn pixel_at(x: i32, y: i32) -> image::Rgba<u8> {
        image::Rgba([(x & 0xff) as u8, (y & 0xff) as u8, ((x + y) & 0xff) as u8, 255])
    }

    fn record(&self, call: DisplayCall) {
        self.calls.borrow_mut().push(call);
    }

    fn allocate_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl SelectionDisplay for MockDisplay {
    fn root(&self) -> WindowId {
        MOCK_ROOT
    }

    fn screen_size(&self) -> ScreenSize {
        self.screen
    }

    fn create_font_cursor(&self, shape: CursorShape) -> SelectionResult<CursorId> {
        if let Some(limit) = self.cursor_limit {
            if self.cursors_created.get() >= limit {
                return Err(SelectionError::request("CreateGlyphCursor", "BadAlloc"));
            }
        }
        self.cursors_created.set(self.cursors_created.get() + 1);
        let cursor = self.allocate_id();
        self.record(DisplayCall::CreateCursor(shape, cursor));
        Ok(cursor)
    }

    fn free_cursor(&self, cursor: CursorId) {
        self.record(DisplayCall::FreeCursor(cursor));
    }

    fn grab_pointer(&self, cursor: CursorId) -> SelectionResult<GrabOutcome> {
        self.record(DisplayCall::GrabPointer(cursor));
        Ok(self.pointer_grab)
    }

    fn change_pointer_grab(&self, cursor: CursorId, events: PointerEvents) -> SelectionResult<()> {
        self.record(DisplayCall::ChangePointerGrab(cursor, events));
        Ok(())
    }

    fn ungrab_pointer(&self) {
        self.record(DisplayCall::UngrabPointer);
    }

    fn grab_keyboard(&self) -> SelectionResult<GrabOutcome> {
        self.record(DisplayCall::GrabKeyboard);
        Ok(self.keyboard_grabs.borrow_mut().pop_front().unwrap_or(GrabOutcome::Success))
    }

    fn ungrab_keyboard(&self) {
        self.record(DisplayCall::UngrabKeyboard);
    }

    fn sync_discard(&self) {
        self.queue.borrow_mut().clear();
        self.record(DisplayCall::SyncDiscard);
    }

    fn flush(&self) {}

    fn poll_event(&self) -> SelectionResult<Option<InputEvent>> {
        Ok(self.queue.borrow_mut().pop_front())
    }

    fn wait_readable(&self) -> std::io::Result<()> {
        match self.script.borrow_mut().pop_front() {
            Some(ScriptStep::Batch(events)) => {
                self.queue.borrow_mut().extend(events);
                Ok(())
            }
            Some(ScriptStep::WaitError(errno)) => Err(std::io::Error::from_raw_os_error(errno)),
            None => Err(std::io::Error::from_raw_os_error(libc::EBADF)),
        }
    }

    fn keysym(&self, keycode: u8) -> SelectionResult<Option<Keysym>> {
        Ok(self.keymap.get(&keycode).copied())
    }

    fn window_at(&self, child: Option<WindowId>, _x: i32, _y: i32) -> SelectionResult<Option<WindowId>> {
        Ok(child)
    }

    fn window_geometry(&self, window: WindowId, _border: bool) -> SelectionResult<Option<SelectionRect>> {
        if window == MOCK_ROOT {
            let ScreenSize { width, height } = self.screen;
            return Ok(Some(SelectionRect::new(0, 0, width as u32, height as u32)));
        }
        Ok(self.windows.get(&window).copied())
    }

    fn bell(&self) {
        self.record(DisplayCall::Bell);
    }

    fn alloc_named_color(&self, name: &str) -> SelectionResult<Option<NamedColor>> {
        self.record(DisplayCall::AllocColor(name.to_string()));
        Ok(self.colors.get(&name.to_ascii_lowercase()).copied())
    }

    fn create_xor_gc(&self, _color: NamedColor, _line: &LineOptions) -> SelectionResult<GcId> {
        let gc = self.allocate_id();
        self.record(DisplayCall::CreateXorGc(gc));
        Ok(gc)
    }

    fn draw_rectangle(&self, gc: GcId, rect: SelectionRect) {
        self.record(DisplayCall::DrawRectangle(gc, rect));
    }

    fn free_gc(&self, gc: GcId) {
        self.record(DisplayCall::FreeGc(gc));
    }

    fn create_frame_window(&self, _color: NamedColor, _opacity: u8) -> SelectionResult<WindowId> {
        let window = self.allocate_id();
        self.record(DisplayCall::CreateFrame(window));
        Ok(window)
    }

    fn show_frame(&self, window: WindowId, rect: SelectionRect, _width: u32) -> SelectionResult<()> {
        self.record(DisplayCall::ShowFrame(window, rect));
        Ok(())
    }

    fn destroy_frame_window(&self, window: WindowId) {
        self.record(DisplayCall::DestroyFrame(window));
    }
}

impl ScreenSource for MockDisplay {
    fn grab_region(&self, rect: SelectionRect) -> SelectionResult<image::RgbaImage> {
        self.record(DisplayCall::GrabRegion(rect));
        Ok(image::RgbaImage::from_fn(rect.w, rect.h, |x, y| {
            Self::pixel_at(rect.x + x as i32, rect.y + y as i32)
        }))
    }

    fn pointer_image(&self) -> SelectionResult<Option<PointerImage>> {
        Ok(self.pointer_image.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_releases_batches_in_order() {
        let display = MockDisplay::new(100, 100)
            .with_batch(vec![InputEvent::Motion { x: 1, y: 1 }])
            .with_wait_error(libc::EINTR)
            .with_batch(vec![InputEvent::KeyRelease]);

        assert_eq!(display.poll_event().unwrap(), None);
        display.wait_readable().unwrap();
        assert_eq!(display.poll_event().unwrap(), Some(InputEvent::Motion { x: 1, y: 1 }));

        let err = display.wait_readable().unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINTR));

        display.wait_readable().unwrap();
        assert_eq!(display.poll_event().unwrap(), Some(InputEvent::KeyRelease));

        let err = display.wait_readable().unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }

    #[test]
    fn test_keyboard_grab_outcomes_then_success() {
        let display = MockDisplay::new(10, 10).with_keyboard_grabs([GrabOutcome::AlreadyGrabbed]);
        assert_eq!(display.grab_keyboard().unwrap(), GrabOutcome::AlreadyGrabbed);
        assert_eq!(display.grab_keyboard().unwrap(), GrabOutcome::Success);
    }

    #[test]
    fn test_cursor_limit() {
        let display = MockDisplay::new(10, 10).with_cursor_limit(1);
        assert!(display.create_font_cursor(CursorShape::Cross).is_ok());
        assert!(display.create_font_cursor(CursorShape::Cross).is_err());
    }

    #[test]
    fn test_grab_region_uses_root_coordinates() {
        let display = MockDisplay::new(100, 100);
        let image = display.grab_region(SelectionRect::new(5, 7, 3, 2)).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(*image.get_pixel(0, 0), MockDisplay::pixel_at(5, 7));
        assert_eq!(*image.get_pixel(2, 1), MockDisplay::pixel_at(7, 8));
    }

    #[test]
    fn test_unknown_color() {
        let display = MockDisplay::new(10, 10);
        assert!(display.alloc_named_color("gray").unwrap().is_some());
        assert!(display.alloc_named_color("no-such-colour").unwrap().is_none());
    }
}
