//! Image buffer wrapper for captured regions
//!
//! This module provides an `ImageBuffer` wrapper around `image::RgbaImage`
//! with the compositing operations applied after a selection: blending the
//! line colour over a region, punching a hole that keeps the original
//! pixels, and drawing the mouse pointer on top.
//!
//! Region arguments are in image coordinates and may lie partly or wholly
//! outside the image; they are clipped first.
//!
//! # Examples
//!
//! ```
//! use scrot_select::{capture::ImageBuffer, model::SelectionRect};
//!
//! let mut img = ImageBuffer::from_test_pattern(200, 200);
//! let original = img.clone();
//!
//! // Dim everything except a 50x50 square
//! img.punch_hole(SelectionRect::new(50, 50, 50, 50), [0, 0, 0], 128);
//! assert_eq!(img.pixel(75, 75), original.pixel(75, 75));
//! assert_ne!(img.pixel(10, 10), original.pixel(10, 10));
//! ```

use image::{Rgba, RgbaImage};

use crate::{display::PointerImage, model::SelectionRect};

/// A region clipped to the image bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Wrapper around `image::RgbaImage` with compositing methods
///
/// Compositing methods modify the buffer in place; `clone()` gives an
/// independent copy.
#[derive(Clone, Debug)]
pub struct ImageBuffer {
    inner: RgbaImage,
}

impl ImageBuffer {
    /// Creates a new ImageBuffer from an RGBA image
    ///
    /// # Examples
    ///
    /// ```
    /// use scrot_select::capture::ImageBuffer;
    ///
    /// let buffer = ImageBuffer::new(image::RgbaImage::new(100, 100));
    /// assert_eq!(buffer.dimensions(), (100, 100));
    /// ```
    pub fn new(image: RgbaImage) -> Self {
        Self { inner: image }
    }

    /// Returns the dimensions of the image as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    /// Returns the image width in pixels
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    /// Returns the image height in pixels
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// Pixel at `(x, y)`; panics outside the image like `RgbaImage`
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.inner.get_pixel(x, y)
    }

    /// Intersection of `rect` with the image, `None` if empty
    ///
    /// # Examples
    ///
    /// ```
    /// use scrot_select::{capture::{ImageBuffer, image_buffer::Span}, model::SelectionRect};
    ///
    /// let img = ImageBuffer::from_test_pattern(100, 100);
    /// let span = img.clip(SelectionRect::new(-10, 90, 30, 30)).unwrap();
    /// assert_eq!(span, Span { x: 0, y: 90, w: 20, h: 10 });
    /// assert!(img.clip(SelectionRect::new(100, 0, 5, 5)).is_none());
    /// ```
    pub fn clip(&self, rect: SelectionRect) -> Option<Span> {
        let (width, height) = self.dimensions();
        let left = i64::from(rect.x).max(0);
        let top = i64::from(rect.y).max(0);
        let right = (i64::from(rect.x) + i64::from(rect.w)).min(i64::from(width));
        let bottom = (i64::from(rect.y) + i64::from(rect.h)).min(i64::from(height));

        if left >= right || top >= bottom {
            return None;
        }
        Some(Span {
            x: left as u32,
            y: top as u32,
            w: (right - left) as u32,
            h: (bottom - top) as u32,
        })
    }

    /// Blends `rgb` at `alpha` over the clipped region
    ///
    /// `alpha` 255 paints the colour opaque, 0 leaves the pixels unchanged.
    /// The alpha channel of the image is kept.
    pub fn fill_blend(&mut self, rect: SelectionRect, rgb: [u8; 3], alpha: u8) {
        let Some(span) = self.clip(rect) else { return };
        let a = u32::from(alpha);

        for y in span.y..span.y + span.h {
            for x in span.x..span.x + span.w {
                let pixel = self.inner.get_pixel_mut(x, y);
                for (channel, color) in pixel.0.iter_mut().take(3).zip(rgb) {
                    *channel = blend(*channel, color, a);
                }
            }
        }
    }

    /// Copies the clipped region from `source` at the same position
    pub fn copy_region_from(&mut self, source: &ImageBuffer, rect: SelectionRect) {
        let Some(span) = self.clip(rect) else { return };
        let Some(span) = source.clip(SelectionRect::new(span.x as i32, span.y as i32, span.w, span.h))
        else {
            return;
        };

        for y in span.y..span.y + span.h {
            for x in span.x..span.x + span.w {
                self.inner.put_pixel(x, y, source.pixel(x, y));
            }
        }
    }

    /// Covers the whole image with the colour except `inner`
    ///
    /// Pixels inside `inner` keep their original values.
    pub fn punch_hole(&mut self, inner: SelectionRect, rgb: [u8; 3], alpha: u8) {
        let original = self.clone();
        let (width, height) = self.dimensions();
        self.fill_blend(SelectionRect::new(0, 0, width, height), rgb, alpha);
        self.copy_region_from(&original, inner);
    }

    /// Covers only `inner` with the colour
    pub fn hide(&mut self, inner: SelectionRect, rgb: [u8; 3], alpha: u8) {
        self.fill_blend(inner, rgb, alpha);
    }

    /// Draws the pointer image over the buffer
    ///
    /// `origin` is the root-window position of the buffer's top-left pixel.
    /// The pointer is placed so that its hotspot lies on the pointer
    /// position; parts outside the buffer are dropped.
    pub fn composite_pointer(&mut self, pointer: &PointerImage, origin: (i32, i32)) {
        let left = pointer.x - pointer.xhot as i32 - origin.0;
        let top = pointer.y - pointer.yhot as i32 - origin.1;
        let Some(span) = self.clip(SelectionRect::new(left, top, pointer.width, pointer.height)) else {
            return;
        };

        for y in span.y..span.y + span.h {
            for x in span.x..span.x + span.w {
                let src_x = (x as i32 - left) as u32;
                let src_y = (y as i32 - top) as u32;
                let Some(&argb) = pointer.pixels.get((src_y * pointer.width + src_x) as usize) else {
                    continue;
                };
                let pixel = self.inner.get_pixel_mut(x, y);
                *pixel = over_premultiplied(argb, *pixel);
            }
        }
    }

    /// Creates a test pattern image with the specified dimensions
    ///
    /// Generates a vertical gradient from blue (top) to cyan (bottom),
    /// useful for testing without a display.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrot_select::capture::ImageBuffer;
    ///
    /// let img = ImageBuffer::from_test_pattern(1920, 1080);
    /// assert_eq!(img.dimensions(), (1920, 1080));
    /// ```
    pub fn from_test_pattern(width: u32, height: u32) -> Self {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            let ratio = y as f32 / height.max(1) as f32;
            Rgba([(x % 256) as u8, (255.0 * ratio) as u8, 255, 255])
        });
        Self::new(img)
    }

    /// Returns a reference to the inner image
    pub fn inner(&self) -> &RgbaImage {
        &self.inner
    }

    /// Consumes self and returns the inner image
    pub fn into_inner(self) -> RgbaImage {
        self.inner
    }
}

impl From<RgbaImage> for ImageBuffer {
    fn from(image: RgbaImage) -> Self {
        Self::new(image)
    }
}

/// `dst * (1 - a) + src * a` on 8-bit channels, rounded
fn blend(dst: u8, src: u8, alpha: u32) -> u8 {
    ((u32::from(dst) * (255 - alpha) + u32::from(src) * alpha + 127) / 255) as u8
}

/// Premultiplied ARGB source over an opaque-or-not RGBA destination
fn over_premultiplied(argb: u32, dst: Rgba<u8>) -> Rgba<u8> {
    let a = argb >> 24;
    let src = [(argb >> 16) & 0xff, (argb >> 8) & 0xff, argb & 0xff];
    let mut out = dst;
    for (channel, s) in out.0.iter_mut().take(3).zip(src) {
        let value = s + (u32::from(*channel) * (255 - a) + 127) / 255;
        *channel = value.min(255) as u8;
    }
    out
}
