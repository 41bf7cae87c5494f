//! Hotspots: movable circular regions that concentrate sample points.
//!
//! Each hotspot owns a scatter of integer sample points drawn inside its
//! disk. Denser points near a face's features give the Voronoi diagram
//! smaller cells there, and the cell renderer uses the distance to the
//! nearest hotspot to pick between filled cells and stipples.

use std::f64::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{PipelineError, Point, SamplePoint};

/// Stable identifier of a hotspot within a session's hotspot collection.
///
/// Classified points refer to their nearest hotspot by id so the
/// collection stays the sole owner of hotspot geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HotspotId(pub usize);

impl HotspotId {
    /// Index into the hotspot slice.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A circular region in image space with its own sample scatter.
///
/// Geometry changes never resample implicitly: callers batch
/// [`set_geometry`](Self::set_geometry) calls (e.g. when loading a
/// preset) and then call [`resample`](Self::resample) once per hotspot.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    center: Point,
    radius: f64,
    points: Vec<SamplePoint>,
}

impl Default for Hotspot {
    fn default() -> Self {
        Self {
            center: Point::new(0.0, 0.0),
            radius: 1.0,
            points: Vec::new(),
        }
    }
}

impl Hotspot {
    /// Create a hotspot with no sample points.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidHotspot`] if the center is not
    /// finite or the radius is negative or not finite.
    pub fn new(center: Point, radius: f64) -> Result<Self, PipelineError> {
        validate_geometry(center, radius)?;
        Ok(Self {
            center,
            radius,
            points: Vec::new(),
        })
    }

    /// Center in image space.
    #[must_use]
    pub const fn center(&self) -> Point {
        self.center
    }

    /// Radius in pixels.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// The current sample scatter.
    #[must_use]
    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    /// Move and resize the hotspot.
    ///
    /// Leaves the sample points untouched; call [`resample`](Self::resample)
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidHotspot`] if the center is not
    /// finite or the radius is negative or not finite. The hotspot is
    /// unchanged on error.
    pub fn set_geometry(&mut self, center: Point, radius: f64) -> Result<(), PipelineError> {
        validate_geometry(center, radius)?;
        self.center = center;
        self.radius = radius;
        Ok(())
    }

    /// Distance from `p` to the center.
    #[must_use]
    pub fn distance_to(&self, p: Point) -> f64 {
        self.center.distance(p)
    }

    /// Returns `true` if `p` lies strictly inside the disk.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        self.distance_to(p) < self.radius
    }

    /// Replace the sample scatter with `count` fresh points.
    ///
    /// Each point takes a uniform angle in `[0, 2π)` and a uniform radial
    /// offset in `[0, radius)`. The offset is truncated toward zero before
    /// being added to the center, and the sum is truncated toward zero.
    /// Truncation around a fractional center can push a point past the
    /// rim; such draws are repeated up to [`MAX_DRAWS`] times before
    /// falling back to the integer coordinate nearest the center.
    ///
    /// Every point therefore lies within `radius` of the center, unless
    /// the disk holds no integer coordinate at all, in which case every
    /// point is the nearest one. A zero radius collapses the scatter onto
    /// the center.
    pub fn resample(&mut self, count: usize, rng: &mut impl Rng) {
        self.points.clear();
        self.points.reserve(count);

        for _ in 0..count {
            let point = (0..MAX_DRAWS)
                .map(|_| self.draw(rng))
                .find(|&p| self.covers(p))
                .unwrap_or_else(|| self.nearest_to_center());
            self.points.push(point);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn draw(&self, rng: &mut impl Rng) -> SamplePoint {
        let angle = rng.r#gen::<f64>() * TAU;
        let radial = rng.r#gen::<f64>() * self.radius;
        let dx = (radial * angle.cos()).trunc();
        let dy = (radial * angle.sin()).trunc();
        SamplePoint::new(
            (self.center.x + dx).trunc() as i32,
            (self.center.y + dy).trunc() as i32,
        )
    }

    fn covers(&self, p: SamplePoint) -> bool {
        p.to_point().distance(self.center) <= self.radius
    }

    #[allow(clippy::cast_possible_truncation)]
    fn nearest_to_center(&self) -> SamplePoint {
        SamplePoint::new(self.center.x.round() as i32, self.center.y.round() as i32)
    }
}

/// Draws per sample point before [`Hotspot::resample`] gives up on the
/// disk and uses the integer coordinate nearest the center.
pub const MAX_DRAWS: usize = 16;

fn validate_geometry(center: Point, radius: f64) -> Result<(), PipelineError> {
    if !center.is_finite() {
        return Err(PipelineError::InvalidHotspot(format!(
            "center must be finite, got ({}, {})",
            center.x, center.y
        )));
    }
    if !radius.is_finite() || radius < 0.0 {
        return Err(PipelineError::InvalidHotspot(format!(
            "radius must be finite and non-negative, got {radius}"
        )));
    }
    Ok(())
}
