//! Point classification: color lookup and nearest-hotspot association.
//!
//! Every frame the background scatter and all hotspot scatters are
//! combined and classified. Points outside the image are discarded,
//! surviving points pick up the portrait color underneath them, and each
//! is tied to the nearest hotspot whose disk encloses it. Points that no
//! hotspot encloses are dropped: they would only ever produce skipped
//! cells.

use serde::{Deserialize, Serialize};

use crate::hotspot::{Hotspot, HotspotId};
use crate::source::ColorSource;
use crate::types::{Color, PipelineError, Point, SamplePoint};

/// A sample point that survived classification.
///
/// This is the payload carried by each diagram site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPoint {
    /// Integer location in image space.
    pub position: SamplePoint,
    /// Portrait color at `position`.
    pub color: Color,
    /// Nearest hotspot whose disk strictly contains `position`.
    pub hotspot: HotspotId,
    /// Euclidean distance from `position` to that hotspot's center.
    pub distance: f64,
}

/// Counts describing one classification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyStats {
    /// Points offered to the classifier.
    pub input: usize,
    /// Points rejected for lying outside the image.
    pub out_of_bounds: usize,
    /// In-bounds points that no hotspot encloses.
    pub unassociated: usize,
    /// Points that made it into the output.
    pub classified: usize,
}

/// Result of [`classify`]: surviving points in input order plus counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub points: Vec<ClassifiedPoint>,
    pub stats: ClassifyStats,
}

/// Find the hotspot nearest to `p` among those whose disk strictly
/// contains it.
///
/// Ties keep the earliest hotspot in slice order. Returns `None` when no
/// hotspot encloses `p`.
#[must_use]
pub fn nearest_hotspot(p: Point, hotspots: &[Hotspot]) -> Option<(HotspotId, f64)> {
    let mut best: Option<(HotspotId, f64)> = None;
    for (i, hotspot) in hotspots.iter().enumerate() {
        let d = hotspot.distance_to(p);
        if d < hotspot.radius() && best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((HotspotId(i), d));
        }
    }
    best
}

/// Classify sample points against a portrait and its hotspots.
///
/// For each point, in order:
///
/// 1. Reject it if `x < 0`, `x > width`, `y < 0` or `y > height`. Points
///    exactly on `width` or `height` are kept; their color is read from
///    the last column or row.
/// 2. Look up the portrait color.
/// 3. Associate it with [`nearest_hotspot`], dropping it if none encloses
///    it.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyImage`] if the portrait has a zero-sized
/// side.
pub fn classify<'a>(
    points: impl IntoIterator<Item = &'a SamplePoint>,
    image: &impl ColorSource,
    hotspots: &[Hotspot],
) -> Result<Classification, PipelineError> {
    let dimensions = image.dimensions();
    if dimensions.is_empty() {
        return Err(PipelineError::EmptyImage {
            width: dimensions.width,
            height: dimensions.height,
        });
    }

    let width = i64::from(dimensions.width);
    let height = i64::from(dimensions.height);
    let mut out = Classification::default();

    for &position in points {
        out.stats.input += 1;

        let x = i64::from(position.x);
        let y = i64::from(position.y);
        if x < 0 || x > width || y < 0 || y > height {
            out.stats.out_of_bounds += 1;
            continue;
        }

        let Some((hotspot, distance)) = nearest_hotspot(position.to_point(), hotspots) else {
            out.stats.unassociated += 1;
            continue;
        };

        // In range by the bounds check above; the clamp only moves the
        // far-edge row and column onto the last pixel.
        let px = u32::try_from(x).unwrap_or(0).min(dimensions.width - 1);
        let py = u32::try_from(y).unwrap_or(0).min(dimensions.height - 1);

        out.points.push(ClassifiedPoint {
            position,
            color: image.color_at(px, py),
            hotspot,
            distance,
        });
    }

    out.stats.classified = out.points.len();
    Ok(out)
}
