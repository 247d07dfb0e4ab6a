//! Live selection outline backends
//!
//! The session renders feedback through [`Outline`], a closed enum over the
//! two backends. Which one is used is decided once from
//! [`LineMode`](crate::model::LineMode) when the session is created.
//!
//! - [`ClassicOutline`]: XOR rectangle drawn on the root window. Drawing the
//!   same rectangle twice restores the screen, which is how the previous
//!   rectangle is erased on every motion.
//! - [`EdgeOutline`]: an override-redirect window shaped into a frame around
//!   the selection, with the line colour as background and the line opacity
//!   as window opacity hint.

use crate::{
    display::{GcId, NamedColor, SelectionDisplay, WindowId},
    error::{SelectionError, SelectionResult},
    model::{LineMode, LineOptions, SelectionRect},
};

/// Capability interface shared by the outline backends
///
/// Creation is each backend's constructor. `destroy` is idempotent and also
/// runs on drop.
pub trait OutlineStrategy {
    /// Final render once the drag ended
    fn draw(&mut self, last: Option<SelectionRect>);

    /// Incremental render while dragging
    fn motion_draw(&mut self, previous: Option<SelectionRect>, current: SelectionRect);

    /// Releases the server resources of the backend
    fn destroy(&mut self);
}

/// Allocates the configured line colour
///
/// # Errors
///
/// [`SelectionError::ColorAllocation`] if the server does not know the name.
pub fn resolve_line_color<D: SelectionDisplay + ?Sized>(
    display: &D,
    line: &LineOptions,
) -> SelectionResult<NamedColor> {
    let name = line.color_name();
    display.alloc_named_color(name)?.ok_or_else(|| {
        tracing::error!("Failed to allocate line colour '{}'", name);
        SelectionError::ColorAllocation {
            color: name.to_string(),
        }
    })
}

/// XOR rectangle on the root window
pub struct ClassicOutline<'d, D: SelectionDisplay + ?Sized> {
    display: &'d D,
    gc:      Option<GcId>,
}

impl<'d, D: SelectionDisplay + ?Sized> ClassicOutline<'d, D> {
    /// Allocates the line colour and the XOR graphics context
    pub fn create(display: &'d D, line: &LineOptions) -> SelectionResult<Self> {
        let color = resolve_line_color(display, line)?;
        let gc = display.create_xor_gc(color, line)?;
        Ok(Self {
            display,
            gc: Some(gc),
        })
    }
}

impl<D: SelectionDisplay + ?Sized> OutlineStrategy for ClassicOutline<'_, D> {
    fn draw(&mut self, last: Option<SelectionRect>) {
        if let (Some(gc), Some(rect)) = (self.gc, last) {
            self.display.draw_rectangle(gc, rect);
        }
    }

    fn motion_draw(&mut self, previous: Option<SelectionRect>, current: SelectionRect) {
        let Some(gc) = self.gc else { return };
        if let Some(previous) = previous {
            self.display.draw_rectangle(gc, previous);
        }
        self.display.draw_rectangle(gc, current);
    }

    fn destroy(&mut self) {
        if let Some(gc) = self.gc.take() {
            self.display.free_gc(gc);
        }
    }
}

impl<D: SelectionDisplay + ?Sized> Drop for ClassicOutline<'_, D> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Shaped frame window around the selection
pub struct EdgeOutline<'d, D: SelectionDisplay + ?Sized> {
    display: &'d D,
    window:  Option<WindowId>,
    width:   u32,
}

impl<'d, D: SelectionDisplay + ?Sized> EdgeOutline<'d, D> {
    /// Allocates the line colour and the (unmapped) frame window
    pub fn create(display: &'d D, line: &LineOptions) -> SelectionResult<Self> {
        let color = resolve_line_color(display, line)?;
        let window = display.create_frame_window(color, line.opacity)?;
        Ok(Self {
            display,
            window: Some(window),
            width: line.width,
        })
    }
}

impl<D: SelectionDisplay + ?Sized> OutlineStrategy for EdgeOutline<'_, D> {
    fn draw(&mut self, _last: Option<SelectionRect>) {
        self.display.flush();
    }

    fn motion_draw(&mut self, _previous: Option<SelectionRect>, current: SelectionRect) {
        let Some(window) = self.window else { return };
        if let Err(e) = self.display.show_frame(window, current, self.width) {
            tracing::warn!("Failed to update selection frame: {}", e);
        }
    }

    fn destroy(&mut self) {
        if let Some(window) = self.window.take() {
            self.display.destroy_frame_window(window);
        }
    }
}

impl<D: SelectionDisplay + ?Sized> Drop for EdgeOutline<'_, D> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// The outline backend bound to a session
pub enum Outline<'d, D: SelectionDisplay + ?Sized> {
    Classic(ClassicOutline<'d, D>),
    Edge(EdgeOutline<'d, D>),
}

impl<'d, D: SelectionDisplay + ?Sized> Outline<'d, D> {
    /// Creates the backend selected by `line.mode`
    pub fn create(display: &'d D, line: &LineOptions) -> SelectionResult<Self> {
        let outline = match line.mode {
            LineMode::Classic => Outline::Classic(ClassicOutline::create(display, line)?),
            LineMode::Edge => Outline::Edge(EdgeOutline::create(display, line)?),
        };
        tracing::debug!("Bound {:?} outline", line.mode);
        Ok(outline)
    }

    fn strategy(&mut self) -> &mut dyn OutlineStrategy {
        match self {
            Outline::Classic(classic) => classic,
            Outline::Edge(edge) => edge,
        }
    }
}

impl<D: SelectionDisplay + ?Sized> OutlineStrategy for Outline<'_, D> {
    fn draw(&mut self, last: Option<SelectionRect>) {
        self.strategy().draw(last);
    }

    fn motion_draw(&mut self, previous: Option<SelectionRect>, current: SelectionRect) {
        self.strategy().motion_draw(previous, current);
    }

    fn destroy(&mut self) {
        self.strategy().destroy();
    }
}
