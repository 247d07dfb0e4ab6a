//! X11 display using x11rb
//!
//! This module implements [`SelectionDisplay`] and [`ScreenSource`] over a
//! single [`RustConnection`]. It provides:
//!
//! - **Cursor font cursors**: the crosshair/spray can/target and the four
//!   corner angles, built from the standard `cursor` font
//! - **Grabs**: pointer grab confined to the root, keyboard grab, active
//!   grab cursor changes
//! - **Event translation**: x11rb events to [`InputEvent`]
//! - **Readiness wait**: blocking poll on the connection socket
//! - **Window lookup**: deepest window at a point, client/frame geometry
//! - **Outline primitives**: XOR graphics context on the root and a shaped
//!   override-redirect frame window
//! - **Pixel grabs**: `GetImage` on the root and the XFixes cursor image
//!
//! # Examples
//!
//! ```rust,ignore
//! use scrot_select::{display::X11Display, model::SelectionOptions, selection::Selector};
//!
//! let display = X11Display::connect(None)?;
//! let mut selector = Selector::new(&display, SelectionOptions::default());
//! if let Some(rect) = selector.get_user_selection()? {
//!     println!("selected {rect}");
//! }
//! ```

use std::collections::VecDeque;

use x11rb::{
    COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME, NONE,
    connection::{Connection as _, RequestConnection as _},
    errors::ReplyError,
    protocol::{
        Event,
        shape::{self, ConnectionExt as _},
        xfixes::ConnectionExt as _,
        xproto::{
            self, AtomEnum, ChangeWindowAttributesAux, ClipOrdering, ConfigureWindowAux,
            ConnectionExt as _, CreateGCAux, CreateWindowAux, EventMask, GX, GrabMode, GrabStatus,
            ImageFormat, ImageOrder, MapState, PropMode, Rectangle, StackMode, SubwindowMode,
            Window, WindowClass,
        },
    },
    rust_connection::{PollMode, RustConnection, Stream as _},
    wrapper::ConnectionExt as _,
};

use super::{
    CursorId, CursorShape, GcId, GrabOutcome, InputEvent, Keysym, NamedColor, PointerEvents,
    PointerImage, ScreenSource, SelectionDisplay, WindowId,
};
use crate::{
    error::{SelectionError, SelectionResult},
    model::{LineOptions, LineStyle, ScreenSize, SelectionRect},
};

/// Maps an x11rb error to [`SelectionError::Request`], logging it
fn x11_err<E: std::fmt::Display>(request: &'static str) -> impl FnOnce(E) -> SelectionError {
    move |e| {
        tracing::error!("X11 {} failed: {}", request, e);
        SelectionError::request(request, e)
    }
}

fn grab_outcome(status: GrabStatus) -> GrabOutcome {
    if status == GrabStatus::SUCCESS {
        GrabOutcome::Success
    } else if status == GrabStatus::ALREADY_GRABBED {
        GrabOutcome::AlreadyGrabbed
    } else {
        GrabOutcome::Refused
    }
}

fn event_mask(events: PointerEvents) -> EventMask {
    match events {
        PointerEvents::PressMotionRelease => {
            EventMask::BUTTON_MOTION | EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE
        }
        PointerEvents::MotionRelease => EventMask::BUTTON_MOTION | EventMask::BUTTON_RELEASE,
    }
}

fn translate_event(event: Event) -> InputEvent {
    match event {
        Event::ButtonPress(e) => InputEvent::ButtonPress {
            x:     i32::from(e.event_x),
            y:     i32::from(e.event_y),
            child: (e.child != NONE).then_some(e.child),
        },
        Event::ButtonRelease(e) => InputEvent::ButtonRelease {
            x: i32::from(e.event_x),
            y: i32::from(e.event_y),
        },
        Event::MotionNotify(e) => InputEvent::Motion {
            x: i32::from(e.event_x),
            y: i32::from(e.event_y),
        },
        Event::KeyPress(e) => InputEvent::KeyPress {
            keycode: e.detail,
            x:       i32::from(e.event_x),
            y:       i32::from(e.event_y),
        },
        Event::KeyRelease(_) => InputEvent::KeyRelease,
        _ => InputEvent::Other,
    }
}

fn clamp_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

fn clamp_u16(value: u32) -> u16 {
    value.min(u32::from(u16::MAX)) as u16
}

/// X11 display connection for one selection invocation
///
/// Owns the connection, the opened cursor font and a few interned atoms.
/// Not `Sync`: the selection is single-threaded and all requests go through
/// this one connection.
#[derive(Debug)]
pub struct X11Display {
    conn:          RustConnection,
    root:          Window,
    size:          ScreenSize,
    colormap:      u32,
    white_pixel:   u32,
    black_pixel:   u32,
    lsb_first:     bool,
    cursor_font:   u32,
    opacity_atom:  u32,
    wm_state_atom: u32,
    has_xfixes:    bool,
}

impl X11Display {
    /// Connects to the X server named by `display_name` or `$DISPLAY`
    ///
    /// # Errors
    ///
    /// - [`SelectionError::DisplayUnavailable`] - no connection could be made
    /// - [`SelectionError::Request`] - opening the cursor font or interning
    ///   atoms failed
    pub fn connect(display_name: Option<&str>) -> SelectionResult<Self> {
        let (conn, screen_num) = x11rb::connect(display_name).map_err(|e| {
            tracing::error!("Failed to connect to X11: {}", e);
            SelectionError::DisplayUnavailable {
                reason: e.to_string(),
            }
        })?;

        let setup = conn.setup();
        let screen = &setup.roots[screen_num];
        let root = screen.root;
        let size = ScreenSize::new(
            i32::from(screen.width_in_pixels),
            i32::from(screen.height_in_pixels),
        );
        let colormap = screen.default_colormap;
        let white_pixel = screen.white_pixel;
        let black_pixel = screen.black_pixel;
        let lsb_first = setup.image_byte_order == ImageOrder::LSB_FIRST;
        tracing::debug!(
            "X11 connection established (screen {}, {}x{})",
            screen_num,
            size.width,
            size.height
        );

        let cursor_font = conn.generate_id().map_err(x11_err("GenerateId"))?;
        conn.open_font(cursor_font, b"cursor").map_err(x11_err("OpenFont"))?;

        let opacity_cookie = conn
            .intern_atom(false, b"_NET_WM_WINDOW_OPACITY")
            .map_err(x11_err("InternAtom"))?;
        let wm_state_cookie = conn.intern_atom(false, b"WM_STATE").map_err(x11_err("InternAtom"))?;
        let opacity_atom = opacity_cookie.reply().map_err(x11_err("InternAtom"))?.atom;
        let wm_state_atom = wm_state_cookie.reply().map_err(x11_err("InternAtom"))?.atom;

        let has_xfixes = conn
            .extension_information(x11rb::protocol::xfixes::X11_EXTENSION_NAME)
            .ok()
            .flatten()
            .is_some()
            && conn
                .xfixes_query_version(5, 0)
                .ok()
                .and_then(|cookie| cookie.reply().ok())
                .is_some();
        if !has_xfixes {
            tracing::debug!("XFixes unavailable, pointer compositing disabled");
        }

        Ok(Self {
            conn,
            root,
            size,
            colormap,
            white_pixel,
            black_pixel,
            lsb_first,
            cursor_font,
            opacity_atom,
            wm_state_atom,
            has_xfixes,
        })
    }

    /// Walks up from `window` to the child of the root that contains it
    ///
    /// Returns the frame and the number of levels climbed.
    fn top_level_frame(&self, mut window: Window) -> (Window, u32) {
        let mut frames = 0;
        loop {
            let tree = match self.conn.query_tree(window).map(|cookie| cookie.reply()) {
                Ok(Ok(tree)) => tree,
                _ => break,
            };
            if tree.parent == NONE || tree.parent == tree.root {
                break;
            }
            window = tree.parent;
            frames += 1;
        }
        (window, frames)
    }

    fn has_wm_state(&self, window: Window) -> bool {
        self.conn
            .get_property(false, window, self.wm_state_atom, AtomEnum::ANY, 0, 0)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .is_some_and(|reply| reply.type_ != NONE)
    }

    /// Breadth-first search below a frame for the window carrying WM_STATE
    fn client_window(&self, frame: Window) -> Window {
        let mut pending = VecDeque::from([frame]);
        while let Some(window) = pending.pop_front() {
            if self.has_wm_state(window) {
                return window;
            }
            if let Ok(Ok(tree)) = self.conn.query_tree(window).map(|cookie| cookie.reply()) {
                pending.extend(tree.children);
            }
        }
        frame
    }
}

impl Drop for X11Display {
    fn drop(&mut self) {
        if let Err(e) = self.conn.close_font(self.cursor_font) {
            tracing::warn!("Failed to close cursor font: {}", e);
        }
        if let Err(e) = self.conn.flush() {
            tracing::warn!("Failed to flush connection on close: {}", e);
        }
    }
}

impl SelectionDisplay for X11Display {
    fn root(&self) -> WindowId {
        self.root
    }

    fn screen_size(&self) -> ScreenSize {
        self.size
    }

    fn create_font_cursor(&self, shape: CursorShape) -> SelectionResult<CursorId> {
        let cursor = self.conn.generate_id().map_err(x11_err("GenerateId"))?;
        let glyph = shape.glyph();
        self.conn
            .create_glyph_cursor(
                cursor,
                self.cursor_font,
                self.cursor_font,
                glyph,
                glyph + 1,
                0,
                0,
                0,
                0xffff,
                0xffff,
                0xffff,
            )
            .map_err(x11_err("CreateGlyphCursor"))?;
        tracing::trace!("Created cursor {:?} ({:#x})", shape, cursor);
        Ok(cursor)
    }

    fn free_cursor(&self, cursor: CursorId) {
        if let Err(e) = self.conn.free_cursor(cursor) {
            tracing::warn!("Failed to free cursor {:#x}: {}", cursor, e);
        }
    }

    fn grab_pointer(&self, cursor: CursorId) -> SelectionResult<GrabOutcome> {
        let reply = self
            .conn
            .grab_pointer(
                false,
                self.root,
                event_mask(PointerEvents::PressMotionRelease),
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                self.root,
                cursor,
                CURRENT_TIME,
            )
            .map_err(x11_err("GrabPointer"))?
            .reply()
            .map_err(x11_err("GrabPointer"))?;
        Ok(grab_outcome(reply.status))
    }

    fn change_pointer_grab(&self, cursor: CursorId, events: PointerEvents) -> SelectionResult<()> {
        self.conn
            .change_active_pointer_grab(cursor, CURRENT_TIME, event_mask(events))
            .map_err(x11_err("ChangeActivePointerGrab"))?;
        Ok(())
    }

    fn ungrab_pointer(&self) {
        if let Err(e) = self.conn.ungrab_pointer(CURRENT_TIME) {
            tracing::warn!("Failed to ungrab pointer: {}", e);
        }
    }

    fn grab_keyboard(&self) -> SelectionResult<GrabOutcome> {
        let reply = self
            .conn
            .grab_keyboard(false, self.root, CURRENT_TIME, GrabMode::ASYNC, GrabMode::ASYNC)
            .map_err(x11_err("GrabKeyboard"))?
            .reply()
            .map_err(x11_err("GrabKeyboard"))?;
        Ok(grab_outcome(reply.status))
    }

    fn ungrab_keyboard(&self) {
        if let Err(e) = self.conn.ungrab_keyboard(CURRENT_TIME) {
            tracing::warn!("Failed to ungrab keyboard: {}", e);
        }
    }

    fn sync_discard(&self) {
        match self.conn.get_input_focus() {
            Ok(cookie) => {
                if let Err(e) = cookie.reply() {
                    tracing::warn!("X11 sync failed: {}", e);
                }
            }
            Err(e) => tracing::warn!("X11 sync failed: {}", e),
        }
        let mut discarded = 0usize;
        while let Ok(Some(_)) = self.conn.poll_for_event() {
            discarded += 1;
        }
        tracing::trace!("Discarded {} pending events", discarded);
    }

    fn flush(&self) {
        if let Err(e) = self.conn.flush() {
            tracing::warn!("Failed to flush X11 connection: {}", e);
        }
    }

    fn poll_event(&self) -> SelectionResult<Option<InputEvent>> {
        let event = self.conn.poll_for_event().map_err(x11_err("PollForEvent"))?;
        Ok(event.map(translate_event))
    }

    fn wait_readable(&self) -> std::io::Result<()> {
        self.conn.stream().poll(PollMode::Readable)
    }

    fn keysym(&self, keycode: u8) -> SelectionResult<Option<Keysym>> {
        let reply = self
            .conn
            .get_keyboard_mapping(keycode, 1)
            .map_err(x11_err("GetKeyboardMapping"))?
            .reply()
            .map_err(x11_err("GetKeyboardMapping"))?;
        Ok(reply.keysyms.first().copied().filter(|&sym| sym != NONE))
    }

    fn window_at(&self, child: Option<WindowId>, x: i32, y: i32) -> SelectionResult<Option<WindowId>> {
        let mut source = self.root;
        let mut window = child.unwrap_or(self.root);
        let (mut x, mut y) = (clamp_i16(x), clamp_i16(y));

        loop {
            let reply = match self
                .conn
                .translate_coordinates(source, window, x, y)
                .map_err(x11_err("TranslateCoordinates"))?
                .reply()
            {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::debug!("TranslateCoordinates stopped descent: {}", e);
                    break;
                }
            };
            if !reply.same_screen || reply.child == NONE {
                break;
            }
            source = window;
            window = reply.child;
            x = reply.dst_x;
            y = reply.dst_y;
        }

        Ok(Some(window))
    }

    fn window_geometry(&self, window: WindowId, border: bool) -> SelectionResult<Option<SelectionRect>> {
        let mut target = window;
        let mut frames = 0;

        if target != self.root {
            let (frame, climbed) = self.top_level_frame(target);
            target = frame;
            frames = climbed;

            if !border {
                target = self.client_window(frame);
                let raise = ConfigureWindowAux::new().stack_mode(StackMode::ABOVE);
                if let Err(e) = self.conn.configure_window(target, &raise) {
                    tracing::debug!("Failed to raise window {:#x}: {}", target, e);
                }
            }
        }

        let attributes = match self
            .conn
            .get_window_attributes(target)
            .map_err(x11_err("GetWindowAttributes"))?
            .reply()
        {
            Ok(attributes) => attributes,
            Err(e) => {
                tracing::debug!("Window {:#x} vanished: {}", target, e);
                return Ok(None);
            }
        };
        if attributes.map_state != MapState::VIEWABLE {
            tracing::debug!("Window {:#x} is not viewable", target);
            return Ok(None);
        }

        let geometry = match self.conn.get_geometry(target).map_err(x11_err("GetGeometry"))?.reply() {
            Ok(geometry) => geometry,
            Err(e) => {
                tracing::debug!("GetGeometry on {:#x} failed: {}", target, e);
                return Ok(None);
            }
        };
        let origin = self
            .conn
            .translate_coordinates(target, self.root, 0, 0)
            .map_err(x11_err("TranslateCoordinates"))?
            .reply()
            .map_err(x11_err("TranslateCoordinates"))?;

        let mut rect = SelectionRect::new(
            i32::from(origin.dst_x),
            i32::from(origin.dst_y),
            u32::from(geometry.width),
            u32::from(geometry.height),
        );

        // Window managers that draw the border on the client window itself.
        if border && frames < 2 && geometry.border_width > 0 {
            let bw = u32::from(geometry.border_width);
            rect.x -= bw as i32;
            rect.y -= bw as i32;
            rect.w += bw * 2;
            rect.h += bw * 2;
        }

        Ok(Some(rect))
    }

    fn bell(&self) {
        if let Err(e) = self.conn.bell(0) {
            tracing::warn!("Failed to ring bell: {}", e);
        }
        self.flush();
    }

    fn alloc_named_color(&self, name: &str) -> SelectionResult<Option<NamedColor>> {
        let cookie = self
            .conn
            .alloc_named_color(self.colormap, name.as_bytes())
            .map_err(x11_err("AllocNamedColor"))?;
        match cookie.reply() {
            Ok(reply) => Ok(Some(NamedColor {
                pixel: reply.pixel,
                red:   reply.visual_red,
                green: reply.visual_green,
                blue:  reply.visual_blue,
            })),
            Err(ReplyError::X11Error(e)) => {
                tracing::debug!("Colour '{}' rejected: {:?}", name, e.error_kind);
                Ok(None)
            }
            Err(e) => Err(x11_err("AllocNamedColor")(e)),
        }
    }

    fn create_xor_gc(&self, color: NamedColor, line: &LineOptions) -> SelectionResult<GcId> {
        let gc = self.conn.generate_id().map_err(x11_err("GenerateId"))?;
        let line_style = match line.style {
            LineStyle::Solid => xproto::LineStyle::SOLID,
            LineStyle::Dash => xproto::LineStyle::ON_OFF_DASH,
        };
        let values = CreateGCAux::new()
            .function(GX::XOR)
            .foreground(self.white_pixel ^ color.pixel)
            .background(self.black_pixel)
            .subwindow_mode(SubwindowMode::INCLUDE_INFERIORS)
            .line_width(line.width)
            .line_style(line_style);
        self.conn.create_gc(gc, self.root, &values).map_err(x11_err("CreateGC"))?;
        Ok(gc)
    }

    fn draw_rectangle(&self, gc: GcId, rect: SelectionRect) {
        let rectangle = Rectangle {
            x:      clamp_i16(rect.x),
            y:      clamp_i16(rect.y),
            width:  clamp_u16(rect.w),
            height: clamp_u16(rect.h),
        };
        if let Err(e) = self.conn.poly_rectangle(self.root, gc, &[rectangle]) {
            tracing::warn!("Failed to draw selection rectangle: {}", e);
        }
        self.flush();
    }

    fn free_gc(&self, gc: GcId) {
        if let Err(e) = self.conn.free_gc(gc) {
            tracing::warn!("Failed to free GC {:#x}: {}", gc, e);
        }
    }

    fn create_frame_window(&self, color: NamedColor, opacity: u8) -> SelectionResult<WindowId> {
        let window = self.conn.generate_id().map_err(x11_err("GenerateId"))?;
        let values = CreateWindowAux::new().background_pixel(color.pixel).override_redirect(1);
        self.conn
            .create_window(
                COPY_DEPTH_FROM_PARENT,
                window,
                self.root,
                0,
                0,
                1,
                1,
                0,
                WindowClass::INPUT_OUTPUT,
                COPY_FROM_PARENT,
                &values,
            )
            .map_err(x11_err("CreateWindow"))?;

        if opacity < u8::MAX {
            let value = u32::from(opacity) * (u32::MAX / 255);
            self.conn
                .change_property32(
                    PropMode::REPLACE,
                    window,
                    self.opacity_atom,
                    AtomEnum::CARDINAL,
                    &[value],
                )
                .map_err(x11_err("ChangeProperty"))?;
        }

        Ok(window)
    }

    fn show_frame(&self, window: WindowId, rect: SelectionRect, width: u32) -> SelectionResult<()> {
        let lw = clamp_u16(width);
        let (w, h) = (clamp_u16(rect.w), clamp_u16(rect.h));
        let outer_w = w.saturating_add(lw.saturating_mul(2));
        let outer_h = h.saturating_add(lw.saturating_mul(2));
        let offset = lw as i16;

        let edges = [
            Rectangle { x: 0, y: 0, width: outer_w, height: lw },
            Rectangle { x: 0, y: offset.saturating_add(h as i16), width: outer_w, height: lw },
            Rectangle { x: 0, y: offset, width: lw, height: h },
            Rectangle { x: offset.saturating_add(w as i16), y: offset, width: lw, height: h },
        ];
        self.conn
            .shape_rectangles(
                shape::SO::SET,
                shape::SK::BOUNDING,
                ClipOrdering::UNSORTED,
                window,
                0,
                0,
                &edges,
            )
            .map_err(x11_err("ShapeRectangles"))?;

        let placement = ConfigureWindowAux::new()
            .x(rect.x - i32::from(lw))
            .y(rect.y - i32::from(lw))
            .width(u32::from(outer_w))
            .height(u32::from(outer_h))
            .stack_mode(StackMode::ABOVE);
        self.conn.configure_window(window, &placement).map_err(x11_err("ConfigureWindow"))?;
        self.conn.map_window(window).map_err(x11_err("MapWindow"))?;
        self.flush();
        Ok(())
    }

    fn destroy_frame_window(&self, window: WindowId) {
        let watch = ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY);
        if let Err(e) = self.conn.change_window_attributes(window, &watch) {
            tracing::warn!("Failed to watch frame window {:#x}: {}", window, e);
        }
        if let Err(e) = self.conn.destroy_window(window) {
            tracing::warn!("Failed to destroy frame window {:#x}: {}", window, e);
            return;
        }
        self.flush();

        // The frame must be gone before the screen is grabbed.
        loop {
            match self.conn.wait_for_event() {
                Ok(Event::DestroyNotify(e)) if e.window == window => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Lost connection while destroying frame window: {}", e);
                    break;
                }
            }
        }
    }
}

impl ScreenSource for X11Display {
    fn grab_region(&self, rect: SelectionRect) -> SelectionResult<image::RgbaImage> {
        let (width, height) = (clamp_u16(rect.w), clamp_u16(rect.h));
        let reply = self
            .conn
            .get_image(
                ImageFormat::Z_PIXMAP,
                self.root,
                clamp_i16(rect.x),
                clamp_i16(rect.y),
                width,
                height,
                !0,
            )
            .map_err(x11_err("GetImage"))?
            .reply()
            .map_err(x11_err("GetImage"))?;

        if reply.depth != 24 && reply.depth != 32 {
            return Err(SelectionError::ImageError(format!(
                "unsupported root depth {}",
                reply.depth
            )));
        }

        let (width, height) = (u32::from(width), u32::from(height));
        let needed = width as usize * height as usize * 4;
        if reply.data.len() < needed {
            return Err(SelectionError::ImageError(format!(
                "GetImage returned {} bytes, expected {}",
                reply.data.len(),
                needed
            )));
        }

        let data = reply.data;
        let lsb_first = self.lsb_first;
        Ok(image::RgbaImage::from_fn(width, height, |x, y| {
            let i = (y as usize * width as usize + x as usize) * 4;
            let px = &data[i..i + 4];
            if lsb_first {
                image::Rgba([px[2], px[1], px[0], 255])
            } else {
                image::Rgba([px[1], px[2], px[3], 255])
            }
        }))
    }

    fn pointer_image(&self) -> SelectionResult<Option<PointerImage>> {
        if !self.has_xfixes {
            return Ok(None);
        }
        let reply = self
            .conn
            .xfixes_get_cursor_image()
            .map_err(x11_err("XFixesGetCursorImage"))?
            .reply()
            .map_err(x11_err("XFixesGetCursorImage"))?;
        Ok(Some(PointerImage {
            x:      i32::from(reply.x),
            y:      i32::from(reply.y),
            width:  u32::from(reply.width),
            height: u32::from(reply.height),
            xhot:   u32::from(reply.xhot),
            yhot:   u32::from(reply.yhot),
            pixels: reply.cursor_image,
        }))
    }
}
