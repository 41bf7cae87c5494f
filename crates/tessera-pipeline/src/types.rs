//! Shared types for the tessera rendering pipeline.

use serde::{Deserialize, Serialize};

use crate::diagram::DiagramError;

/// Re-export `RgbaImage` so downstream crates can hand portraits to a
/// [`Session`](crate::Session) without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Returns `true` if both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An integer sample coordinate in image space.
///
/// Sample points are ephemeral: they are regenerated on every hotspot
/// resample or portrait change and never persisted. Coordinates may
/// fall outside the image (hotspots can overhang the edges); the
/// classifier discards those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SamplePoint {
    /// Horizontal position (pixels from left edge).
    pub x: i32,
    /// Vertical position (pixels from top edge).
    pub y: i32,
}

impl SamplePoint {
    /// Create a new sample point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The same location as a floating-point [`Point`].
    #[must_use]
    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

/// An RGBA color with 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl From<image::Rgba<u8>> for Color {
    fn from(pixel: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        Self { r, g, b, a }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Axis-aligned rectangle handed to the diagram builder.
///
/// Uses screen orientation: `top < bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl BoundingRect {
    /// The image rectangle shrunk by `inset` pixels on every side.
    #[must_use]
    pub fn inset(dimensions: Dimensions, inset: f64) -> Self {
        Self {
            left: inset,
            right: f64::from(dimensions.width) - inset,
            top: inset,
            bottom: f64::from(dimensions.height) - inset,
        }
    }

    /// Returns `true` if the rectangle encloses a positive area.
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.left < self.right && self.top < self.bottom
    }

    /// Corner vertices in drawing order, starting top-left.
    #[must_use]
    pub const fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
        ]
    }
}

/// When a hotspot being dragged regenerates its sample points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResamplePolicy {
    /// Resample after every pointer-move during a drag.
    ///
    /// Visually continuous, but the hotspot's points are redrawn on
    /// every event.
    #[default]
    EveryMove,
    /// Resample once when the pointer is released.
    ///
    /// Between moves the hotspot keeps its previous scatter, so the
    /// preview lags the outline until the drag ends.
    OnRelease,
}

/// Configuration for a rendering session.
///
/// All parameters have defaults matching the stock portrait look.
/// Call [`validate`](Self::validate) before handing a config built from
/// untrusted input to [`Session::new`](crate::Session::new); the session
/// validates on construction as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of hotspots created at session start.
    pub hotspot_count: usize,

    /// Sample points drawn inside each hotspot on every resample.
    pub spawn_count: usize,

    /// Uniformly scattered background points per portrait.
    pub background_count: usize,

    /// Fraction of a hotspot radius below which cells are filled.
    /// Between this and the full radius cells become stipples.
    pub falloff: f64,

    /// Width of the grab ring around a hotspot outline, in pixels.
    pub ring_thickness: f64,

    /// When a dragged hotspot regenerates its points.
    pub resample_policy: ResamplePolicy,

    /// Seed for the session RNG. `None` seeds from system entropy,
    /// producing a new scatter on every run.
    pub seed: Option<u64>,
}

impl SessionConfig {
    /// Default number of hotspots.
    pub const DEFAULT_HOTSPOT_COUNT: usize = 4;
    /// Default points per hotspot resample.
    pub const DEFAULT_SPAWN_COUNT: usize = 1000;
    /// Default background scatter size.
    pub const DEFAULT_BACKGROUND_COUNT: usize = 1000;
    /// Default filled/stippled boundary.
    pub const DEFAULT_FALLOFF: f64 = 0.6;
    /// Default grab ring thickness.
    pub const DEFAULT_RING_THICKNESS: f64 = 20.0;

    /// Check the config's invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `falloff` is not a
    /// finite value in `[0, 1]`, `ring_thickness` is negative or not
    /// finite, or `hotspot_count` is zero.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=1.0).contains(&self.falloff) {
            return Err(PipelineError::InvalidConfig(format!(
                "falloff must be within [0, 1], got {}",
                self.falloff
            )));
        }
        if !self.ring_thickness.is_finite() || self.ring_thickness < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "ring thickness must be finite and non-negative, got {}",
                self.ring_thickness
            )));
        }
        if self.hotspot_count == 0 {
            return Err(PipelineError::InvalidConfig(
                "at least one hotspot is required".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hotspot_count: Self::DEFAULT_HOTSPOT_COUNT,
            spawn_count: Self::DEFAULT_SPAWN_COUNT,
            background_count: Self::DEFAULT_BACKGROUND_COUNT,
            falloff: Self::DEFAULT_FALLOFF,
            ring_thickness: Self::DEFAULT_RING_THICKNESS,
            resample_policy: ResamplePolicy::default(),
            seed: None,
        }
    }
}

/// Errors that can occur while running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The portrait has a zero-sized side.
    #[error("image must be non-empty, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// A session was created without any portraits.
    #[error("at least one portrait is required")]
    NoPortraits,

    /// Hotspot geometry violates its invariants.
    #[error("invalid hotspot geometry: {0}")]
    InvalidHotspot(String),

    /// Session configuration is invalid.
    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),

    /// The diagram builder rejected the frame's sites.
    #[error("diagram construction failed: {0}")]
    Diagram(#[from] DiagramError),
}
