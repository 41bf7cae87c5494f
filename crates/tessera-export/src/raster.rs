//! Raster export via `tiny-skia`.
//!
//! Draws the same command list the SVG serializer consumes into an
//! anti-aliased pixmap and converts it to a straight-alpha
//! [`RgbaImage`] ready for `image` to encode.

use image::{Rgba, RgbaImage};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use tessera_pipeline::{Color, Dimensions, DrawCommand, Frame, ManipMode, Overlay, Point};

use crate::{HIGHLIGHT_COLOR, OVERLAY_RING_COLOR, OVERLAY_RING_WIDTH, highlight_shape};

/// Errors raised while rasterizing.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The pixmap could not be allocated for the requested size.
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
}

/// Rasterize draw commands at the image's pixel size.
///
/// `background`, when given, fills the canvas first; `None` leaves it
/// transparent.
///
/// # Errors
///
/// Returns [`ExportError::Canvas`] for a zero-sized or oversized canvas.
pub fn rasterize(
    commands: &[DrawCommand],
    dimensions: Dimensions,
    background: Option<Color>,
) -> Result<RgbaImage, ExportError> {
    let pixmap = draw(commands, dimensions, background)?;
    Ok(to_image(&pixmap))
}

/// Rasterize a frame, including its overlay when the overlay is visible.
///
/// # Errors
///
/// Returns [`ExportError::Canvas`] for a zero-sized or oversized canvas.
pub fn rasterize_frame(frame: &Frame, background: Option<Color>) -> Result<RgbaImage, ExportError> {
    let mut pixmap = draw(&frame.commands, frame.dimensions, background)?;
    if frame.overlay.visible {
        draw_overlay(&mut pixmap, &frame.overlay);
    }
    Ok(to_image(&pixmap))
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

#[allow(clippy::cast_possible_truncation)]
fn stroke(width: f64) -> Stroke {
    Stroke {
        width: width as f32,
        ..Stroke::default()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn polygon_path(boundary: &[Point]) -> Option<Path> {
    let [first, rest @ ..] = boundary else {
        return None;
    };
    if rest.len() < 2 {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    pb.finish()
}

#[allow(clippy::cast_possible_truncation)]
fn circle_path(center: Point, radius: f64) -> Option<Path> {
    PathBuilder::from_circle(center.x as f32, center.y as f32, radius as f32)
}

fn draw(
    commands: &[DrawCommand],
    dimensions: Dimensions,
    background: Option<Color>,
) -> Result<Pixmap, ExportError> {
    let mut pixmap =
        Pixmap::new(dimensions.width, dimensions.height).ok_or(ExportError::Canvas {
            width: dimensions.width,
            height: dimensions.height,
        })?;

    if let Some(c) = background {
        pixmap.fill(tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a));
    }

    for command in commands {
        match command {
            DrawCommand::FilledPolygon {
                boundary,
                fill,
                outline,
            } => {
                // Degenerate boundaries produce no path and are skipped.
                let Some(path) = polygon_path(boundary) else {
                    continue;
                };
                pixmap.fill_path(
                    &path,
                    &paint(*fill),
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
                pixmap.stroke_path(
                    &path,
                    &paint(outline.color),
                    &stroke(outline.width),
                    Transform::identity(),
                    None,
                );
            }
            DrawCommand::WeightedPoint { at, color, weight } => {
                if *weight <= 0.0 {
                    continue;
                }
                if let Some(path) = circle_path(*at, weight / 2.0) {
                    pixmap.fill_path(
                        &path,
                        &paint(*color),
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
        }
    }

    Ok(pixmap)
}

fn draw_overlay(pixmap: &mut Pixmap, overlay: &Overlay) {
    let ring = paint(OVERLAY_RING_COLOR);
    for outline in &overlay.hotspots {
        if let Some(path) = circle_path(outline.center, outline.radius) {
            pixmap.stroke_path(
                &path,
                &ring,
                &stroke(OVERLAY_RING_WIDTH),
                Transform::identity(),
                None,
            );
        }
    }

    let Some((outline, mode)) = highlight_shape(overlay) else {
        return;
    };
    let highlight = paint(HIGHLIGHT_COLOR);
    match mode {
        ManipMode::Move => {
            let inner = (outline.radius - overlay.ring_thickness / 2.0).max(0.0);
            if let Some(path) = circle_path(outline.center, inner) {
                pixmap.fill_path(
                    &path,
                    &highlight,
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
        }
        ManipMode::Scale => {
            if let Some(path) = circle_path(outline.center, outline.radius) {
                pixmap.stroke_path(
                    &path,
                    &highlight,
                    &stroke(overlay.ring_thickness),
                    Transform::identity(),
                    None,
                );
            }
        }
    }
}

/// Convert the pixmap (premultiplied RGBA) to an `RgbaImage` (straight RGBA).
fn to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, premultiplied) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = premultiplied.demultiply();
        *pixel = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}
