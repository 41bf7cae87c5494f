//! tessera-pipeline: Hotspot-driven Voronoi portrait rendering (sans-IO).
//!
//! Turns a portrait into filled Voronoi cells near user-placed hotspots
//! and loose stipple points further out, through:
//! hotspot + background scatter -> classification -> diagram ->
//! per-cell render decision.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! images and returns [`DrawCommand`]s. Rasterizing and SVG output live
//! in `tessera-export`; file handling lives in the `tessera` CLI.
//!
//! # Example
//!
//! ```
//! use tessera_pipeline::{
//!     ClippedVoronoi, Portrait, PresetTable, RgbaImage, Session, SessionConfig,
//! };
//!
//! let image = RgbaImage::from_pixel(64, 48, image::Rgba([200, 120, 80, 255]));
//! let config = SessionConfig {
//!     seed: Some(1),
//!     ..SessionConfig::default()
//! };
//! let mut session = Session::new(
//!     vec![Portrait::new("still.png", image)],
//!     config,
//!     PresetTable::builtin(),
//!     ClippedVoronoi::new(),
//! )?;
//! let frame = session.render_frame()?;
//! assert_eq!(frame.dimensions.width, 64);
//! # Ok::<(), tessera_pipeline::PipelineError>(())
//! ```

pub mod background;
pub mod classify;
pub mod diagnostics;
pub mod diagram;
pub mod hotspot;
pub mod interaction;
pub mod preset;
pub mod render;
pub mod session;
pub mod source;
pub mod types;
pub mod voronoi;

pub use classify::{ClassifiedPoint, ClassifyStats};
pub use diagnostics::FrameDiagnostics;
pub use diagram::{Cell, DiagramAdapter, DiagramBuilder, DiagramCell, DiagramError};
pub use hotspot::{Hotspot, HotspotId};
pub use interaction::{InteractionController, ManipMode, Selection, Viewport};
pub use preset::{Preset, PresetTable};
pub use render::{DrawCommand, Outline, RenderMode, RenderStats};
pub use session::{Frame, HotspotOutline, Overlay, Portrait, Session};
pub use source::ColorSource;
pub use types::{
    BoundingRect, Color, Dimensions, PipelineError, Point, ResamplePolicy, RgbaImage,
    SamplePoint, SessionConfig,
};
pub use voronoi::ClippedVoronoi;
