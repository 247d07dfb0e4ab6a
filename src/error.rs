//! Error types for interactive selection
//!
//! Every variant here is fatal for the current invocation: by the time an
//! error is returned, the session guards have already released the pointer
//! and keyboard grabs, the cursors and the outline resources. Expected
//! outcomes such as a user abort or an unresolvable window click are not
//! errors and surface as `Ok(None)` from the selection entry points.

/// Result type alias for selection operations
pub type SelectionResult<T> = Result<T, SelectionError>;

/// Comprehensive error type for selection and capture operations
///
/// Each variant includes context and provides a remediation hint through the
/// `remediation_hint()` method.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    /// Another client holds an exclusive pointer grab
    #[error("couldn't grab pointer")]
    PointerGrab,

    /// The keyboard stayed grabbed by another client after all retries
    #[error("failed to grab keyboard after {attempts} attempts")]
    KeyboardGrab {
        /// Number of grab attempts made, including the first one
        attempts: u32,
    },

    /// Waiting on the display connection failed unrecoverably
    #[error("Connection to X display lost: {source}")]
    ConnectionLost {
        /// Underlying OS error from the readiness wait
        source: std::io::Error,
    },

    /// The configured line colour could not be allocated
    #[error("Error allocate color: {color}")]
    ColorAllocation {
        /// Colour name that the server rejected
        color: String,
    },

    /// No display connection could be established
    #[error("X display is not available: {reason}")]
    DisplayUnavailable {
        /// Reason reported by the connection layer
        reason: String,
    },

    /// A protocol request failed
    #[error("X request {request} failed: {reason}")]
    Request {
        /// Name of the request that failed
        request: &'static str,
        /// Reason reported by the server or connection
        reason:  String,
    },

    /// An option value is out of range or malformed
    #[error("Invalid option '{option}': {reason}")]
    InvalidOption {
        /// Name of the invalid option
        option: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Image processing error
    #[error("Image processing error: {0}")]
    ImageError(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SelectionError {
    /// Builds a [`SelectionError::Request`] from any displayable cause
    pub fn request(request: &'static str, cause: impl std::fmt::Display) -> Self {
        Self::Request {
            request,
            reason: cause.to_string(),
        }
    }

    /// Builds a [`SelectionError::InvalidOption`]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Returns an actionable remediation hint for this error
    ///
    /// # Examples
    ///
    /// ```
    /// use scrot_select::error::SelectionError;
    ///
    /// let hint = SelectionError::PointerGrab.remediation_hint();
    /// assert!(hint.contains("grab"));
    /// ```
    pub fn remediation_hint(&self) -> &str {
        match self {
            SelectionError::PointerGrab => {
                "Another client holds an exclusive pointer grab. Close open menus or other \
                 screenshot tools and try again."
            }
            SelectionError::KeyboardGrab { .. } => {
                "Another client kept the keyboard grabbed. Release any key-binding daemon grab \
                 (or run the command after the triggering key is released) and try again."
            }
            SelectionError::ConnectionLost { .. } => {
                "The X server connection went away while waiting for input. Check that the X \
                 server is still running."
            }
            SelectionError::ColorAllocation { .. } => {
                "Use a colour name known to the X server (see rgb.txt), for example 'gray' or \
                 'red'."
            }
            SelectionError::DisplayUnavailable { .. } => {
                "Ensure you're running in an X11 session with the DISPLAY environment variable \
                 set."
            }
            SelectionError::Request { .. } => {
                "An X protocol request failed. The target window may have been destroyed during \
                 the selection."
            }
            SelectionError::InvalidOption { option, .. } => match option.as_str() {
                "width" => "Line width must be between 1 and 8.",
                "opacity" => "Line opacity must be between 0 and 255.",
                "mode" => "Line mode must be 'classic' or 'edge'.",
                "style" => "Line style must be 'solid' or 'dash'.",
                _ => "Check the option value against the command help.",
            },
            SelectionError::ImageError(_) => {
                "Image processing failed. Ensure the selected region lies on screen."
            }
            SelectionError::Io(_) => {
                "An I/O error occurred. Check file permissions, disk space, and system resources."
            }
        }
    }
}
