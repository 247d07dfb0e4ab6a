//! Data models and option types for scrot-select
//!
//! This module defines the core types used throughout the crate:
//! - The selection rectangle and screen dimensions
//! - Selection and line-drawing modes
//! - The read-only option set consumed by a selection session

use serde::{Deserialize, Serialize};

use crate::error::{SelectionError, SelectionResult};

/// Default line colour used when none is configured
pub const DEFAULT_LINE_COLOR: &str = "gray";

/// Default line opacity (0-255)
pub const DEFAULT_LINE_OPACITY: u8 = 100;

/// Allowed outline width range in pixels
pub const LINE_WIDTH_RANGE: std::ops::RangeInclusive<u32> = 1..=8;

/// A selected screen area in root-window coordinates
///
/// Width and height are at least 1 once produced by
/// [`calculate_rect`](crate::selection::rect::calculate_rect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub w: u32,
    /// Height in pixels
    pub h: u32,
}

impl SelectionRect {
    /// Creates a new SelectionRect
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Exclusive right edge
    pub fn right(&self) -> i32 {
        self.x + self.w as i32
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i32 {
        self.y + self.h as i32
    }
}

impl std::fmt::Display for SelectionRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.w, self.h, self.x, self.y)
    }
}

/// Dimensions of the screen the selection happens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    /// Width in pixels
    pub width:  i32,
    /// Height in pixels
    pub height: i32,
}

impl ScreenSize {
    /// Creates a new ScreenSize
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// What the selected rectangles are used for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Plain capture of one rectangle
    #[default]
    Capture,
    /// Paint over a second rectangle inside the capture
    Hide,
    /// Overlay the capture with colour except for a second rectangle
    Hole,
}

impl SelectionMode {
    /// Returns true for modes that need a second rectangle
    pub fn is_composite(&self) -> bool {
        matches!(self, SelectionMode::Hide | SelectionMode::Hole)
    }

    /// Returns the mode as a lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Capture => "capture",
            SelectionMode::Hide => "hide",
            SelectionMode::Hole => "hole",
        }
    }
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which outline backend renders the live selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineMode {
    /// XOR rectangle drawn directly on the root window
    #[default]
    Classic,
    /// Shaped frame window around the selection
    Edge,
}

/// Dash pattern of the classic outline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    /// Continuous line
    #[default]
    Solid,
    /// On/off dashes
    Dash,
}

/// Appearance of the selection outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineOptions {
    /// Outline backend
    pub mode:    LineMode,
    /// Dash pattern (classic only)
    pub style:   LineStyle,
    /// Line width in pixels
    pub width:   u32,
    /// X colour name; [`DEFAULT_LINE_COLOR`] when unset
    pub color:   Option<String>,
    /// Opacity 0-255, used by the edge window and composite fills
    pub opacity: u8,
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            mode:    LineMode::default(),
            style:   LineStyle::default(),
            width:   1,
            color:   None,
            opacity: DEFAULT_LINE_OPACITY,
        }
    }
}

impl LineOptions {
    /// Parses a `key=value` list such as `mode=edge,width=3,color=red`
    ///
    /// Recognised keys are `mode`, `style`, `width`, `color` and `opacity`.
    /// Unspecified keys keep their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrot_select::model::{LineMode, LineOptions};
    ///
    /// let line = LineOptions::parse("mode=edge,width=3,color=red").unwrap();
    /// assert_eq!(line.mode, LineMode::Edge);
    /// assert_eq!(line.width, 3);
    /// assert_eq!(line.color.as_deref(), Some("red"));
    /// ```
    pub fn parse(input: &str) -> SelectionResult<Self> {
        let mut line = Self::default();

        for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, value) = token.split_once('=').ok_or_else(|| {
                SelectionError::invalid_option(token, "expected key=value")
            })?;
            let value = value.trim().trim_matches('"');

            match key.trim() {
                "mode" => {
                    line.mode = match value {
                        "classic" => LineMode::Classic,
                        "edge" => LineMode::Edge,
                        _ => return Err(SelectionError::invalid_option("mode", value)),
                    }
                }
                "style" => {
                    line.style = match value {
                        "solid" => LineStyle::Solid,
                        "dash" => LineStyle::Dash,
                        _ => return Err(SelectionError::invalid_option("style", value)),
                    }
                }
                "width" => {
                    line.width = value.parse().map_err(|_| {
                        SelectionError::invalid_option("width", format!("'{value}' is not a number"))
                    })?;
                }
                "color" => {
                    if value.is_empty() {
                        return Err(SelectionError::invalid_option("color", "empty colour name"));
                    }
                    line.color = Some(value.to_string());
                }
                "opacity" => {
                    line.opacity = value.parse().map_err(|_| {
                        SelectionError::invalid_option(
                            "opacity",
                            format!("'{value}' is not in 0-255"),
                        )
                    })?;
                }
                other => {
                    return Err(SelectionError::invalid_option(other, "unknown line option"));
                }
            }
        }

        line.validate()?;
        Ok(line)
    }

    /// Checks value ranges that the type does not encode
    pub fn validate(&self) -> SelectionResult<()> {
        if !LINE_WIDTH_RANGE.contains(&self.width) {
            return Err(SelectionError::invalid_option(
                "width",
                format!("value {} outside 1-8", self.width),
            ));
        }
        Ok(())
    }

    /// Configured colour name, or the default
    pub fn color_name(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_LINE_COLOR)
    }
}

/// Options consumed by the selection session and mode orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOptions {
    /// Selection mode
    pub mode:            SelectionMode,
    /// Outline appearance
    pub line:            LineOptions,
    /// Swallow key presses instead of aborting (Escape still aborts)
    pub ignore_keyboard: bool,
    /// Do not ring the bell after a selection
    pub silent:          bool,
    /// Seconds to wait between selection and capture
    pub delay:           u64,
    /// Print a countdown while waiting
    pub countdown:       bool,
    /// Composite the mouse pointer into the capture
    pub pointer:         bool,
    /// Include the window manager frame on window clicks
    pub border:          bool,
}

impl SelectionOptions {
    /// Validates every nested option
    pub fn validate(&self) -> SelectionResult<()> {
        self.line.validate()
    }
}
