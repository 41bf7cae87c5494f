//! Background scatter: uniform sample points across the whole portrait.
//!
//! The background points give the Voronoi diagram coverage outside the
//! hotspots so cells near a hotspot's edge stay bounded by nearby sites
//! instead of stretching to the image border. They are generated once
//! per portrait selection, not per frame.

use rand::Rng;

use crate::types::{Dimensions, PipelineError, SamplePoint};

/// Scatter `count` independent uniform points over
/// `[0, width) × [0, height)`.
///
/// Deterministic only if `rng` was seeded by the caller.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyImage`] if either side of `dimensions`
/// is zero.
pub fn generate(
    dimensions: Dimensions,
    count: usize,
    rng: &mut impl Rng,
) -> Result<Vec<SamplePoint>, PipelineError> {
    if dimensions.is_empty() {
        return Err(PipelineError::EmptyImage {
            width: dimensions.width,
            height: dimensions.height,
        });
    }

    let points = (0..count)
        .map(|_| {
            let x = rng.gen_range(0..dimensions.width);
            let y = rng.gen_range(0..dimensions.height);
            SamplePoint::new(
                i32::try_from(x).unwrap_or(i32::MAX),
                i32::try_from(y).unwrap_or(i32::MAX),
            )
        })
        .collect();
    Ok(points)
}
