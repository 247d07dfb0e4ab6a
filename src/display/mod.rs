//! Display server abstractions used by the selection session
//!
//! The selection logic never talks to the X server directly. It goes through
//! two traits:
//!
//! - [`SelectionDisplay`]: cursors, grabs, input events, window lookup and
//!   the drawing primitives the outline backends need
//! - [`ScreenSource`]: raw pixel grabs and the current pointer image, used
//!   once the rectangles are known
//!
//! [`x11::X11Display`] implements both over an x11rb connection;
//! [`mock::MockDisplay`] implements both from a script for tests.
//!
//! Release operations (`free_cursor`, `ungrab_pointer`, `free_gc`, ...)
//! return nothing: they run from guard destructors and report failures
//! through `tracing` only.

use crate::{
    error::SelectionResult,
    model::{LineOptions, ScreenSize, SelectionRect},
};

pub mod mock;

#[cfg(all(target_os = "linux", feature = "linux-x11"))]
pub mod x11;

pub use mock::MockDisplay;
#[cfg(all(target_os = "linux", feature = "linux-x11"))]
pub use x11::X11Display;

/// Server-side window id
pub type WindowId = u32;

/// Server-side cursor id
pub type CursorId = u32;

/// Server-side graphics context id
pub type GcId = u32;

/// X keysym value
pub type Keysym = u32;

/// Keysyms the event loop reacts to
pub mod keysym {
    use super::Keysym;

    /// XK_Escape
    pub const ESCAPE: Keysym = 0xff1b;
    /// XK_Left
    pub const LEFT: Keysym = 0xff51;
    /// XK_Up
    pub const UP: Keysym = 0xff52;
    /// XK_Right
    pub const RIGHT: Keysym = 0xff53;
    /// XK_Down
    pub const DOWN: Keysym = 0xff54;
}

/// Glyphs of the standard X cursor font used during selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorShape {
    /// XC_cross
    Cross,
    /// XC_spraycan
    SprayCan,
    /// XC_target
    Target,
    /// XC_ur_angle
    UpperRightAngle,
    /// XC_ul_angle
    UpperLeftAngle,
    /// XC_lr_angle
    LowerRightAngle,
    /// XC_ll_angle
    LowerLeftAngle,
}

impl CursorShape {
    /// Index of the glyph in the cursor font; the mask is the next glyph
    pub fn glyph(&self) -> u16 {
        match self {
            CursorShape::Cross => 30,
            CursorShape::SprayCan => 124,
            CursorShape::Target => 128,
            CursorShape::UpperRightAngle => 144,
            CursorShape::UpperLeftAngle => 142,
            CursorShape::LowerRightAngle => 78,
            CursorShape::LowerLeftAngle => 76,
        }
    }
}

/// Result of a pointer or keyboard grab request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabOutcome {
    /// The grab is now held by this client
    Success,
    /// Another client holds an active grab
    AlreadyGrabbed,
    /// The grab window is not viewable, the time is invalid or the
    /// device is frozen
    Refused,
}

/// Which events the active pointer grab reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvents {
    /// Button motion, press and release (initial grab)
    PressMotionRelease,
    /// Button motion and release (while dragging)
    MotionRelease,
}

/// Input events the selection loop consumes
///
/// Coordinates are relative to the root window, which is the grab window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A pointer button went down
    ButtonPress {
        /// Pointer x
        x:     i32,
        /// Pointer y
        y:     i32,
        /// Child of the root under the pointer, if any
        child: Option<WindowId>,
    },
    /// A pointer button went up
    ButtonRelease {
        /// Pointer x
        x: i32,
        /// Pointer y
        y: i32,
    },
    /// The pointer moved with a button held
    Motion {
        /// Pointer x
        x: i32,
        /// Pointer y
        y: i32,
    },
    /// A key went down
    KeyPress {
        /// Hardware keycode
        keycode: u8,
        /// Pointer x at the time of the key press
        x:       i32,
        /// Pointer y at the time of the key press
        y:       i32,
    },
    /// A key went up (ignored)
    KeyRelease,
    /// Any other event delivered on the connection
    Other,
}

/// A colour allocated in the default colormap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedColor {
    /// Pixel value in the default colormap
    pub pixel: u32,
    /// 16-bit red channel
    pub red:   u16,
    /// 16-bit green channel
    pub green: u16,
    /// 16-bit blue channel
    pub blue:  u16,
}

impl NamedColor {
    /// Channels scaled down to 8 bits
    pub fn rgb8(&self) -> [u8; 3] {
        [(self.red >> 8) as u8, (self.green >> 8) as u8, (self.blue >> 8) as u8]
    }
}

/// Current pointer image as reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerImage {
    /// Pointer x on the root window
    pub x:      i32,
    /// Pointer y on the root window
    pub y:      i32,
    /// Image width
    pub width:  u32,
    /// Image height
    pub height: u32,
    /// Hotspot x inside the image
    pub xhot:   u32,
    /// Hotspot y inside the image
    pub yhot:   u32,
    /// Premultiplied ARGB pixels, row-major
    pub pixels: Vec<u32>,
}

/// Display operations needed by one selection session
///
/// All methods take `&self` so that guards owning different resources can
/// share one display reference for the whole session.
pub trait SelectionDisplay {
    /// Root window of the screen
    fn root(&self) -> WindowId;

    /// Size of the screen
    fn screen_size(&self) -> ScreenSize;

    /// Creates a cursor from the standard cursor font
    fn create_font_cursor(&self, shape: CursorShape) -> SelectionResult<CursorId>;

    /// Frees a cursor created by [`create_font_cursor`](Self::create_font_cursor)
    fn free_cursor(&self, cursor: CursorId);

    /// Grabs the pointer on the root window, confined to it
    fn grab_pointer(&self, cursor: CursorId) -> SelectionResult<GrabOutcome>;

    /// Changes the cursor and event mask of the active pointer grab
    fn change_pointer_grab(&self, cursor: CursorId, events: PointerEvents) -> SelectionResult<()>;

    /// Releases the pointer grab
    fn ungrab_pointer(&self);

    /// Grabs the keyboard on the root window
    fn grab_keyboard(&self) -> SelectionResult<GrabOutcome>;

    /// Releases the keyboard grab
    fn ungrab_keyboard(&self);

    /// Round-trips to the server and discards every queued event
    fn sync_discard(&self);

    /// Flushes buffered requests
    fn flush(&self);

    /// Returns the next queued event without blocking
    fn poll_event(&self) -> SelectionResult<Option<InputEvent>>;

    /// Blocks until the connection is readable
    ///
    /// Errors carry the raw OS error so the caller can tell a lost
    /// connection from an interrupted wait.
    fn wait_readable(&self) -> std::io::Result<()>;

    /// First keysym bound to a keycode
    fn keysym(&self, keycode: u8) -> SelectionResult<Option<Keysym>>;

    /// Deepest window containing the point, starting from `child`
    fn window_at(&self, child: Option<WindowId>, x: i32, y: i32) -> SelectionResult<Option<WindowId>>;

    /// Geometry of a window in root coordinates, `None` if it is not viewable
    ///
    /// With `border` the window manager frame is included, otherwise the
    /// client window is used.
    fn window_geometry(&self, window: WindowId, border: bool) -> SelectionResult<Option<SelectionRect>>;

    /// Rings the bell
    fn bell(&self);

    /// Allocates a named colour, `None` if the name is unknown
    fn alloc_named_color(&self, name: &str) -> SelectionResult<Option<NamedColor>>;

    /// Creates an XOR graphics context on the root window
    fn create_xor_gc(&self, color: NamedColor, line: &LineOptions) -> SelectionResult<GcId>;

    /// Draws a rectangle outline with a graphics context
    fn draw_rectangle(&self, gc: GcId, rect: SelectionRect);

    /// Frees a graphics context
    fn free_gc(&self, gc: GcId);

    /// Creates an unmapped override-redirect window used as outline frame
    fn create_frame_window(&self, color: NamedColor, opacity: u8) -> SelectionResult<WindowId>;

    /// Shapes the frame window to surround `rect` and maps it
    fn show_frame(&self, window: WindowId, rect: SelectionRect, width: u32) -> SelectionResult<()>;

    /// Destroys the frame window and waits until the server removed it
    fn destroy_frame_window(&self, window: WindowId);
}

/// Pixel sources used after the selection finished
pub trait ScreenSource {
    /// Grabs the pixels of a root-window region
    fn grab_region(&self, rect: SelectionRect) -> SelectionResult<image::RgbaImage>;

    /// Current pointer image, `None` if the server cannot provide it
    fn pointer_image(&self) -> SelectionResult<Option<PointerImage>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_glyphs_match_cursor_font() {
        assert_eq!(CursorShape::Cross.glyph(), 30);
        assert_eq!(CursorShape::SprayCan.glyph(), 124);
        assert_eq!(CursorShape::Target.glyph(), 128);
        assert_eq!(CursorShape::UpperRightAngle.glyph(), 144);
        assert_eq!(CursorShape::UpperLeftAngle.glyph(), 142);
        assert_eq!(CursorShape::LowerRightAngle.glyph(), 78);
        assert_eq!(CursorShape::LowerLeftAngle.glyph(), 76);
    }

    #[test]
    fn test_named_color_rgb8() {
        let gray = NamedColor {
            pixel: 0xbebebe,
            red:   0xbebe,
            green: 0xbebe,
            blue:  0xbebe,
        };
        assert_eq!(gray.rgb8(), [0xbe, 0xbe, 0xbe]);
    }
}
