//! Bounded Voronoi cells by half-plane clipping.
//!
//! Each site's cell starts as the bounding rectangle and is clipped by
//! the perpendicular bisector towards each neighbour, nearest first. An
//! R\*-tree supplies neighbours in increasing distance, and the search
//! stops as soon as a neighbour is more than twice as far as the cell's
//! farthest vertex: its bisector can no longer reach the cell.
//!
//! Coincident sites are deduplicated. The first occurrence owns the
//! cell and later duplicates receive an empty (degenerate) boundary.

use std::collections::HashMap;

use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::diagram::{DiagramBuilder, DiagramCell, DiagramError};
use crate::types::{BoundingRect, Point};

/// A site location tagged with its index in the submitted slice.
type IndexedSite = GeomWithData<[f64; 2], usize>;

/// Default [`DiagramBuilder`]: per-site clipping against R\*-tree
/// neighbours.
///
/// Keeps its scratch buffers between frames; [`recycle`](DiagramBuilder::recycle)
/// empties them without releasing capacity.
#[derive(Default)]
pub struct ClippedVoronoi {
    owners: HashMap<(u64, u64), usize>,
    scratch: Vec<Point>,
    tree: RTree<IndexedSite>,
}

impl std::fmt::Debug for ClippedVoronoi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClippedVoronoi")
            .field("sites", &self.tree.size())
            .finish_non_exhaustive()
    }
}

impl ClippedVoronoi {
    /// Create a builder with empty scratch state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn cell_for(&mut self, index: usize, site: Point, bounds: BoundingRect) -> Vec<Point> {
        let mut cell = bounds.corners().to_vec();

        for (neighbor, dist_sq) in self
            .tree
            .nearest_neighbor_iter_with_distance_2(&[site.x, site.y])
        {
            if neighbor.data == index {
                continue;
            }
            let reach_sq = cell
                .iter()
                .map(|v| v.distance_squared(site))
                .fold(0.0, f64::max);
            if dist_sq > 4.0 * reach_sq {
                break;
            }

            let [nx, ny] = *neighbor.geom();
            clip_to_bisector(&cell, &mut self.scratch, site, Point::new(nx, ny));
            std::mem::swap(&mut cell, &mut self.scratch);
            if cell.len() < 3 {
                cell.clear();
                break;
            }
        }

        cell
    }
}

impl DiagramBuilder for ClippedVoronoi {
    fn recycle(&mut self) {
        self.owners.clear();
        self.scratch.clear();
        self.tree = RTree::new();
    }

    fn compute(
        &mut self,
        sites: &[Point],
        bounds: BoundingRect,
    ) -> Result<Vec<DiagramCell>, DiagramError> {
        if !bounds.has_area() {
            return Err(DiagramError::EmptyBounds(bounds));
        }
        if let Some(index) = sites.iter().position(|s| !s.is_finite()) {
            return Err(DiagramError::NonFiniteSite { index });
        }

        self.owners.clear();
        let mut unique = Vec::with_capacity(sites.len());
        for (i, s) in sites.iter().enumerate() {
            self.owners
                .entry((s.x.to_bits(), s.y.to_bits()))
                .or_insert_with(|| {
                    unique.push(GeomWithData::new([s.x, s.y], i));
                    i
                });
        }
        self.tree = RTree::bulk_load(unique);

        let mut cells = Vec::with_capacity(sites.len());
        for (i, &site) in sites.iter().enumerate() {
            let owner = self.owners.get(&(site.x.to_bits(), site.y.to_bits()));
            let boundary = if owner == Some(&i) {
                self.cell_for(i, site, bounds)
            } else {
                Vec::new()
            };
            cells.push(DiagramCell { site: i, boundary });
        }

        log::trace!(
            "voronoi: {} sites, {} unique",
            sites.len(),
            self.tree.size()
        );
        Ok(cells)
    }
}

/// Sutherland-Hodgman clip of `polygon` to the half-plane of points at
/// least as close to `site` as to `neighbor`.
///
/// Writes the result into `out`, replacing its contents. Vertex order is
/// preserved.
fn clip_to_bisector(polygon: &[Point], out: &mut Vec<Point>, site: Point, neighbor: Point) {
    out.clear();

    // Inside when p·(n - s) <= (|n|² - |s|²) / 2.
    let nx = neighbor.x - site.x;
    let ny = neighbor.y - site.y;
    let c = (neighbor.x.mul_add(neighbor.x, neighbor.y * neighbor.y)
        - site.x.mul_add(site.x, site.y * site.y))
        / 2.0;
    let side = |p: Point| p.x.mul_add(nx, p.y * ny) - c;

    let Some(&last) = polygon.last() else {
        return;
    };
    let mut prev = last;
    let mut prev_side = side(prev);

    for &cur in polygon {
        let cur_side = side(cur);
        if cur_side <= 0.0 {
            if prev_side > 0.0 {
                out.push(intersect(prev, cur, prev_side, cur_side));
            }
            out.push(cur);
        } else if prev_side <= 0.0 {
            out.push(intersect(prev, cur, prev_side, cur_side));
        }
        prev = cur;
        prev_side = cur_side;
    }
}

/// Point where segment `a -> b` crosses the zero of the side function.
fn intersect(a: Point, b: Point, side_a: f64, side_b: f64) -> Point {
    let t = side_a / (side_a - side_b);
    Point::new((b.x - a.x).mul_add(t, a.x), (b.y - a.y).mul_add(t, a.y))
}
