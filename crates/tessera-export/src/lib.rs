//! tessera-export: Pure draw-command exporters (sans-IO)
//!
//! Converts the draw commands of a tessera frame into output formats.
//! Supports SVG (via the `svg` crate) and raster images (via `tiny-skia`),
//! both with an optional hotspot overlay.

pub mod raster;
pub mod svg;

use tessera_pipeline::{Color, HotspotOutline, ManipMode, Overlay};

pub use raster::{ExportError, rasterize, rasterize_frame};
pub use self::svg::{SvgMetadata, frame_to_svg, to_svg};

/// Canvas color the stock look renders onto.
pub const DEFAULT_BACKGROUND: Color = Color::new(0, 0, 0, 255);

/// Hotspot outline color in the overlay.
pub const OVERLAY_RING_COLOR: Color = Color::new(255, 255, 255, 255);

/// Hotspot outline stroke width in the overlay.
pub const OVERLAY_RING_WIDTH: f64 = 1.0;

/// Translucent green marking the active hotspot.
pub const HIGHLIGHT_COLOR: Color = Color::new(0, 255, 0, 30);

/// The active hotspot's outline and mode, if the overlay has one.
fn highlight_shape(overlay: &Overlay) -> Option<(HotspotOutline, ManipMode)> {
    let selection = overlay.active?;
    let outline = overlay.hotspots.get(selection.hotspot.index())?;
    Some((*outline, selection.mode))
}
