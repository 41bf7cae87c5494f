//! Cell rendering: the level-of-detail rule.
//!
//! Sites deep inside a hotspot render as filled Voronoi cells; sites in
//! the outer band between `radius * falloff` and `radius` fade to
//! stipple points whose weight shrinks linearly towards the edge; sites
//! at or beyond the radius produce nothing.
//!
//! The decision is a pure function of one cell's inputs, so cells can be
//! rendered in any order (or in parallel) with identical results.

use serde::{Deserialize, Serialize};

use crate::diagram::Cell;
use crate::hotspot::Hotspot;
use crate::types::{Color, Point};

/// Stipple weight at the inner edge of the stipple band.
pub const MAX_STIPPLE_WEIGHT: f64 = 10.0;

/// Outline drawn around filled cells: black at ~10% opacity.
pub const CELL_OUTLINE: Outline = Outline {
    color: Color::new(0, 0, 0, 25),
    width: 0.5,
};

/// How a single cell is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Fill the cell polygon with the site color.
    Filled,
    /// Draw one point at the site with the given stroke weight.
    Stipple { weight: f64 },
    /// Draw nothing.
    Skip,
}

/// Pick the render mode for a site at `distance` from the center of a
/// hotspot with `radius`.
///
/// | Condition                          | Mode      |
/// |------------------------------------|-----------|
/// | `d < r * falloff`                  | `Filled`  |
/// | `r * falloff <= d < r`             | `Stipple` |
/// | `d >= r`                           | `Skip`    |
///
/// The stipple weight maps `d = r * falloff` to
/// [`MAX_STIPPLE_WEIGHT`] and falls linearly to 0 at `d = r`.
#[must_use]
pub fn render_mode(distance: f64, radius: f64, falloff: f64) -> RenderMode {
    let inner = radius * falloff;
    if distance < inner {
        RenderMode::Filled
    } else if distance < radius {
        // radius > inner here, so the band has positive width.
        let t = (distance - inner) / (radius - inner);
        RenderMode::Stipple {
            weight: MAX_STIPPLE_WEIGHT * (1.0 - t),
        }
    } else {
        RenderMode::Skip
    }
}

/// Stroke applied around a filled polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub color: Color,
    pub width: f64,
}

/// A drawing instruction for a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// A closed polygon filled with `fill` and stroked with `outline`.
    FilledPolygon {
        boundary: Vec<Point>,
        fill: Color,
        outline: Outline,
    },
    /// A round point of diameter `weight` centered at `at`.
    WeightedPoint { at: Point, color: Color, weight: f64 },
}

/// Counts describing one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    pub cells: usize,
    pub degenerate: usize,
    pub filled: usize,
    pub stippled: usize,
    pub skipped: usize,
}

/// Turn one cell into a draw command, or `None` when the cell is
/// degenerate, skipped, or refers to a hotspot missing from `hotspots`.
#[must_use]
pub fn render_cell(cell: &Cell<'_>, hotspots: &[Hotspot], falloff: f64) -> Option<DrawCommand> {
    if cell.is_degenerate() {
        return None;
    }
    let hotspot = hotspots.get(cell.site.hotspot.index())?;

    match render_mode(cell.site.distance, hotspot.radius(), falloff) {
        RenderMode::Filled => Some(DrawCommand::FilledPolygon {
            boundary: cell.boundary.clone(),
            fill: cell.site.color,
            outline: CELL_OUTLINE,
        }),
        RenderMode::Stipple { weight } => Some(DrawCommand::WeightedPoint {
            at: cell.site.position.to_point(),
            color: cell.site.color,
            weight,
        }),
        RenderMode::Skip => None,
    }
}

/// Render every cell, in order.
#[must_use]
pub fn render_cells(
    cells: &[Cell<'_>],
    hotspots: &[Hotspot],
    falloff: f64,
) -> (Vec<DrawCommand>, RenderStats) {
    let mut stats = RenderStats {
        cells: cells.len(),
        ..RenderStats::default()
    };
    let mut commands = Vec::with_capacity(cells.len());

    for cell in cells {
        if cell.is_degenerate() {
            stats.degenerate += 1;
            continue;
        }
        match render_cell(cell, hotspots, falloff) {
            Some(command @ DrawCommand::FilledPolygon { .. }) => {
                stats.filled += 1;
                commands.push(command);
            }
            Some(command @ DrawCommand::WeightedPoint { .. }) => {
                stats.stippled += 1;
                commands.push(command);
            }
            None => stats.skipped += 1,
        }
    }

    (commands, stats)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::classify::ClassifiedPoint;
    use crate::hotspot::HotspotId;
    use crate::types::SamplePoint;

    fn weight(mode: RenderMode) -> f64 {
        match mode {
            RenderMode::Stipple { weight } => weight,
            other => panic!("expected stipple, got {other:?}"),
        }
    }

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]
    }

    fn site(x: i32, y: i32, distance: f64) -> ClassifiedPoint {
        ClassifiedPoint {
            position: SamplePoint::new(x, y),
            color: Color::new(200, 100, 50, 255),
            hotspot: HotspotId(0),
            distance,
        }
    }

    #[test]
    fn center_is_filled() {
        assert_eq!(render_mode(0.0, 20.0, 0.6), RenderMode::Filled);
    }

    #[test]
    fn inner_bound_is_stipple_at_full_weight() {
        let w = weight(render_mode(20.0 * 0.6, 20.0, 0.6));
        assert!((w - 10.0).abs() < 1e-9);
    }

    #[test]
    fn radius_is_skipped() {
        assert_eq!(render_mode(20.0, 20.0, 0.6), RenderMode::Skip);
        assert_eq!(render_mode(25.0, 20.0, 0.6), RenderMode::Skip);
    }

    #[test]
    fn weight_interpolates_between_bounds() {
        let w = weight(render_mode(15.0, 20.0, 0.6));
        assert!((w - 6.25).abs() < 1e-9);
    }

    #[test]
    fn weight_approaches_zero_at_radius() {
        let w = weight(render_mode(20.0 - 1e-9, 20.0, 0.6));
        assert!(w.abs() < 1e-6);
    }

    #[test]
    fn falloff_one_never_stipples() {
        assert_eq!(render_mode(19.9, 20.0, 1.0), RenderMode::Filled);
        assert_eq!(render_mode(20.0, 20.0, 1.0), RenderMode::Skip);
    }

    #[test]
    fn falloff_zero_never_fills() {
        let w = weight(render_mode(0.0, 20.0, 0.0));
        assert!((w - 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_radius_skips_everything() {
        assert_eq!(render_mode(0.0, 0.0, 0.6), RenderMode::Skip);
    }

    #[test]
    fn filled_cell_copies_boundary_and_color() {
        let hotspots = [Hotspot::new(Point::new(50.0, 50.0), 20.0).unwrap()];
        let s = site(50, 50, 0.0);
        let cell = Cell {
            site: &s,
            boundary: square(),
        };
        let command = render_cell(&cell, &hotspots, 0.6).unwrap();
        assert_eq!(
            command,
            DrawCommand::FilledPolygon {
                boundary: square(),
                fill: Color::new(200, 100, 50, 255),
                outline: CELL_OUTLINE,
            }
        );
    }

    #[test]
    fn stipple_cell_draws_at_site() {
        let hotspots = [Hotspot::new(Point::new(50.0, 50.0), 20.0).unwrap()];
        let s = site(50, 65, 15.0);
        let cell = Cell {
            site: &s,
            boundary: square(),
        };
        let Some(DrawCommand::WeightedPoint { at, color, weight }) =
            render_cell(&cell, &hotspots, 0.6)
        else {
            panic!("expected a weighted point");
        };
        assert_eq!(at, Point::new(50.0, 65.0));
        assert_eq!(color, Color::new(200, 100, 50, 255));
        assert!((weight - 6.25).abs() < 1e-9);
    }

    #[test]
    fn degenerate_cell_renders_nothing() {
        let hotspots = [Hotspot::new(Point::new(50.0, 50.0), 20.0).unwrap()];
        let s = site(50, 50, 0.0);
        let cell = Cell {
            site: &s,
            boundary: Vec::new(),
        };
        assert!(render_cell(&cell, &hotspots, 0.6).is_none());
    }

    #[test]
    fn render_cells_counts_each_outcome() {
        let hotspots = [Hotspot::new(Point::new(50.0, 50.0), 20.0).unwrap()];
        let sites = [site(50, 50, 0.0), site(50, 65, 15.0), site(50, 70, 20.0), site(51, 50, 1.0)];
        let cells = vec![
            Cell { site: &sites[0], boundary: square() },
            Cell { site: &sites[1], boundary: square() },
            Cell { site: &sites[2], boundary: square() },
            Cell { site: &sites[3], boundary: Vec::new() },
        ];
        let (commands, stats) = render_cells(&cells, &hotspots, 0.6);
        assert_eq!(commands.len(), 2);
        assert_eq!(
            stats,
            RenderStats {
                cells: 4,
                degenerate: 1,
                filled: 1,
                stippled: 1,
                skipped: 1,
            }
        );
    }

    fn rank(mode: RenderMode) -> u8 {
        match mode {
            RenderMode::Filled => 0,
            RenderMode::Stipple { .. } => 1,
            RenderMode::Skip => 2,
        }
    }

    proptest! {
        #[test]
        fn modes_progress_monotonically(
            radius in 0.1f64..500.0,
            falloff in 0.0f64..=1.0,
        ) {
            let steps = 400;
            let mut prev_rank = 0;
            let mut prev_weight = f64::INFINITY;
            for i in 0..=steps {
                let d = radius * 1.2 * f64::from(i) / f64::from(steps);
                let mode = render_mode(d, radius, falloff);
                let r = rank(mode);
                prop_assert!(r >= prev_rank, "mode reverted at d={}", d);
                if let RenderMode::Stipple { weight } = mode {
                    prop_assert!(weight <= prev_weight);
                    prop_assert!((0.0..=MAX_STIPPLE_WEIGHT).contains(&weight));
                    prev_weight = weight;
                }
                prev_rank = r;
            }
        }

        #[test]
        fn weight_is_max_at_inner_bound(
            radius in 0.1f64..500.0,
            falloff in 0.0f64..0.99,
        ) {
            let mode = render_mode(radius * falloff, radius, falloff);
            let RenderMode::Stipple { weight } = mode else {
                return Err(TestCaseError::fail("expected stipple at inner bound"));
            };
            prop_assert!((weight - MAX_STIPPLE_WEIGHT).abs() < 1e-9);
        }
    }
}
