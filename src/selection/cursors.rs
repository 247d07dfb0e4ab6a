//! Cursor set for one selection session
//!
//! Five font cursors: the mode cursor shown while waiting for a press, and
//! one angle cursor per drag direction. Each cursor is held by a guard
//! that frees it on drop, so a failure halfway through creating the set
//! frees the cursors that already exist.

use crate::{
    display::{CursorId, CursorShape, SelectionDisplay},
    error::SelectionResult,
    model::SelectionMode,
};

/// Direction of a drag, named after the moving corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Corner {
    /// Corner the pointer is moving towards when dragging from `(x0, y0)`
    /// to `(x1, y1)`
    ///
    /// # Examples
    ///
    /// ```
    /// use scrot_select::selection::cursors::Corner;
    ///
    /// assert_eq!(Corner::of_drag(0, 0, 5, 5), Corner::SouthEast);
    /// assert_eq!(Corner::of_drag(0, 0, 0, 0), Corner::NorthWest);
    /// ```
    pub fn of_drag(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        if x1 > x0 && y1 > y0 {
            Corner::SouthEast
        } else if x1 > x0 {
            Corner::NorthEast
        } else if y1 > y0 {
            Corner::SouthWest
        } else {
            Corner::NorthWest
        }
    }

    fn shape(&self) -> CursorShape {
        match self {
            Corner::NorthEast => CursorShape::UpperRightAngle,
            Corner::NorthWest => CursorShape::UpperLeftAngle,
            Corner::SouthEast => CursorShape::LowerRightAngle,
            Corner::SouthWest => CursorShape::LowerLeftAngle,
        }
    }
}

/// Cursor shown while waiting for the first press
pub fn mode_cursor_shape(mode: SelectionMode) -> CursorShape {
    match mode {
        SelectionMode::Capture => CursorShape::Cross,
        SelectionMode::Hide => CursorShape::SprayCan,
        SelectionMode::Hole => CursorShape::Target,
    }
}

/// A server cursor freed when dropped
struct CursorGuard<'d, D: SelectionDisplay + ?Sized> {
    display: &'d D,
    id:      CursorId,
}

impl<'d, D: SelectionDisplay + ?Sized> CursorGuard<'d, D> {
    fn create(display: &'d D, shape: CursorShape) -> SelectionResult<Self> {
        let id = display.create_font_cursor(shape)?;
        Ok(Self { display, id })
    }
}

impl<D: SelectionDisplay + ?Sized> Drop for CursorGuard<'_, D> {
    fn drop(&mut self) {
        self.display.free_cursor(self.id);
    }
}

/// The five cursors of a session
pub struct CursorSet<'d, D: SelectionDisplay + ?Sized> {
    main:       CursorGuard<'d, D>,
    north_east: CursorGuard<'d, D>,
    north_west: CursorGuard<'d, D>,
    south_east: CursorGuard<'d, D>,
    south_west: CursorGuard<'d, D>,
}

impl<'d, D: SelectionDisplay + ?Sized> CursorSet<'d, D> {
    /// Creates the mode cursor and the four corner cursors
    pub fn create(display: &'d D, mode: SelectionMode) -> SelectionResult<Self> {
        let set = Self {
            main:       CursorGuard::create(display, mode_cursor_shape(mode))?,
            north_east: CursorGuard::create(display, Corner::NorthEast.shape())?,
            north_west: CursorGuard::create(display, Corner::NorthWest.shape())?,
            south_east: CursorGuard::create(display, Corner::SouthEast.shape())?,
            south_west: CursorGuard::create(display, Corner::SouthWest.shape())?,
        };
        tracing::debug!("Created selection cursors for {} mode", mode);
        Ok(set)
    }

    /// Cursor shown before the drag starts
    pub fn main(&self) -> CursorId {
        self.main.id
    }

    /// Cursor for a drag direction
    pub fn corner(&self, corner: Corner) -> CursorId {
        match corner {
            Corner::NorthEast => self.north_east.id,
            Corner::NorthWest => self.north_west.id,
            Corner::SouthEast => self.south_east.id,
            Corner::SouthWest => self.south_west.id,
        }
    }
}
