//! Pixel color lookup for portraits.
//!
//! The pipeline only needs two things from an image: its size and the
//! color at an integer coordinate. [`ColorSource`] captures that seam so
//! tests can classify against synthetic images and callers can plug in
//! whatever decoded buffer they already hold.

use image::RgbaImage;

use crate::types::{Color, Dimensions};

/// Read access to a portrait's pixels.
pub trait ColorSource {
    /// Image size in pixels.
    fn dimensions(&self) -> Dimensions;

    /// Color of the pixel at `(x, y)`.
    ///
    /// Defined for `x < width` and `y < height`.
    fn color_at(&self, x: u32, y: u32) -> Color;
}

impl ColorSource for RgbaImage {
    fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    fn color_at(&self, x: u32, y: u32) -> Color {
        Color::from(*self.get_pixel(x, y))
    }
}
