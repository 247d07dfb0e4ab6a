//! Post-selection image handling
//!
//! - `ImageBuffer`: a wrapper around `image::RgbaImage` with the compositing
//!   operations of the composite selection modes and pointer recording

pub mod image_buffer;

pub use image_buffer::ImageBuffer;
