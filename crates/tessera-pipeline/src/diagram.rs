//! Diagram construction seam: sites in, bounded cells out.
//!
//! The pipeline treats Voronoi construction as an injected service. This
//! module defines the [`DiagramBuilder`] trait for pluggable builders and
//! the [`DiagramAdapter`] that feeds classified points to a builder and
//! correlates the resulting cells back to their originating points.
//!
//! # Strategy pattern
//!
//! The adapter only relies on the trait, so render-decision tests can
//! run against a fake builder returning hand-made cells while the CLI
//! uses [`ClippedVoronoi`](crate::voronoi::ClippedVoronoi).

use crate::classify::ClassifiedPoint;
use crate::types::{BoundingRect, Dimensions, Point};

/// One cell produced by a [`DiagramBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramCell {
    /// Index of the site (in the slice passed to
    /// [`compute`](DiagramBuilder::compute)) this cell belongs to.
    pub site: usize,
    /// Closed polygon boundary in drawing order, without repeating the
    /// first vertex. Empty for degenerate cells.
    pub boundary: Vec<Point>,
}

/// Errors raised while building a diagram.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiagramError {
    /// The bounding rectangle encloses no area.
    #[error("bounding rectangle has no area: {0:?}")]
    EmptyBounds(BoundingRect),

    /// A site coordinate is NaN or infinite.
    #[error("site {index} has a non-finite coordinate")]
    NonFiniteSite { index: usize },

    /// A builder returned a cell for a site that was never submitted.
    #[error("cell refers to site {index}, but only {site_count} sites were submitted")]
    UnknownSite { index: usize, site_count: usize },

    /// Builder-specific failure.
    #[error("{0}")]
    Failed(String),
}

/// Trait for diagram construction strategies.
///
/// Input: site locations and a bounding rectangle.
/// Output: one or more cells, each tagged with its site index.
pub trait DiagramBuilder {
    /// Drop any state retained from the previous build.
    ///
    /// Called by [`DiagramAdapter`] before every build so nothing from
    /// one frame can leak into the next.
    fn recycle(&mut self) {}

    /// Build cells for `sites`, clipped to `bounds`.
    ///
    /// # Errors
    ///
    /// Returns a [`DiagramError`] when the input cannot be triangulated
    /// or clipped.
    fn compute(
        &mut self,
        sites: &[Point],
        bounds: BoundingRect,
    ) -> Result<Vec<DiagramCell>, DiagramError>;
}

/// A diagram cell joined with the classified point it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell<'p> {
    /// The originating site's payload.
    pub site: &'p ClassifiedPoint,
    /// Closed polygon boundary in drawing order.
    pub boundary: Vec<Point>,
}

impl Cell<'_> {
    /// A cell without boundary vertices must be skipped.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.boundary.is_empty()
    }
}

/// Packages classified points as diagram sites and runs a builder.
#[derive(Debug, Clone, Default)]
pub struct DiagramAdapter<B> {
    builder: B,
    sites: Vec<Point>,
}

impl<B: DiagramBuilder> DiagramAdapter<B> {
    /// Distance the bounding rectangle is pulled in from each image edge,
    /// keeping sites on the border from producing zero-width cells.
    pub const BOUNDS_INSET: f64 = 1.0;

    /// Wrap a builder.
    pub const fn new(builder: B) -> Self {
        Self {
            builder,
            sites: Vec::new(),
        }
    }

    /// The wrapped builder.
    pub const fn builder(&self) -> &B {
        &self.builder
    }

    /// Mutable access to the wrapped builder, e.g. to retune it between
    /// frames.
    pub const fn builder_mut(&mut self) -> &mut B {
        &mut self.builder
    }

    /// Build the diagram for one frame.
    ///
    /// Recycles the builder, submits one site per classified point, and
    /// uses the image rectangle inset by [`BOUNDS_INSET`](Self::BOUNDS_INSET).
    /// Cells are returned in the order the builder produced them.
    ///
    /// Images too small to leave any area inside the inset (2 px or less
    /// on a side) skip the builder: every point gets a degenerate cell,
    /// so the frame renders empty instead of failing.
    ///
    /// # Errors
    ///
    /// Propagates the builder's error, and returns
    /// [`DiagramError::UnknownSite`] if the builder reports a site index
    /// that was not submitted.
    pub fn build<'p>(
        &mut self,
        points: &'p [ClassifiedPoint],
        dimensions: Dimensions,
    ) -> Result<Vec<Cell<'p>>, DiagramError> {
        self.builder.recycle();

        self.sites.clear();
        self.sites
            .extend(points.iter().map(|p| p.position.to_point()));

        let bounds = BoundingRect::inset(dimensions, Self::BOUNDS_INSET);
        if !bounds.has_area() {
            log::debug!(
                "{}x{} image leaves no area inside the inset, {} cells degenerate",
                dimensions.width,
                dimensions.height,
                points.len()
            );
            return Ok(points
                .iter()
                .map(|site| Cell {
                    site,
                    boundary: Vec::new(),
                })
                .collect());
        }
        let cells = self.builder.compute(&self.sites, bounds)?;

        cells
            .into_iter()
            .map(|cell| {
                let site = points.get(cell.site).ok_or(DiagramError::UnknownSite {
                    index: cell.site,
                    site_count: points.len(),
                })?;
                Ok(Cell {
                    site,
                    boundary: cell.boundary,
                })
            })
            .collect()
    }
}
