//! SVG export serializer.
//!
//! Converts draw commands into an SVG string using the [`svg`] crate for
//! document construction, XML escaping, and path data formatting.
//!
//! Filled cells become closed `<path>` elements and stipples become
//! `<circle>` elements whose diameter is the stipple weight. The optional
//! hotspot overlay is emitted last, grouped under `<g id="overlay">`.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Group, Path, Rectangle, Title};
use svg::node::{Text, Value};

use tessera_pipeline::{Color, Dimensions, DrawCommand, Frame, ManipMode, Overlay, Point};

use crate::{HIGHLIGHT_COLOR, OVERLAY_RING_COLOR, OVERLAY_RING_WIDTH, highlight_shape};

/// Metadata to embed in the SVG document.
///
/// When present, `<title>` and `<desc>` elements are emitted
/// immediately after the opening `<svg>` tag. Text values are
/// XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, typically the portrait file stem.
    pub title: Option<&'a str>,

    /// Document description, typically the session parameters.
    pub description: Option<&'a str>,
}

/// Build an SVG path `d` attribute for a closed polygon.
///
/// Returns an empty string for polygons with fewer than 3 vertices.
///
/// # Examples
///
/// ```
/// use tessera_pipeline::Point;
/// use tessera_export::svg::build_polygon_data;
///
/// let d = build_polygon_data(&[
///     Point::new(0.0, 0.0),
///     Point::new(10.0, 0.0),
///     Point::new(10.0, 5.5),
/// ]);
/// assert_eq!(d, "M0,0 L10,0 L10,5.5 z");
/// ```
#[must_use]
pub fn build_polygon_data(boundary: &[Point]) -> String {
    let [first, rest @ ..] = boundary else {
        return String::new();
    };
    if rest.len() < 2 {
        return String::new();
    }

    let mut data = Data::new().move_to((first.x, first.y));
    for p in rest {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data.close()))
}

/// `rgb(r,g,b)` paint string; alpha is emitted separately as an opacity.
fn paint(color: Color) -> String {
    format!("rgb({},{},{})", color.r, color.g, color.b)
}

fn opacity(color: Color) -> f64 {
    f64::from(color.a) / 255.0
}

/// Serialize draw commands into an SVG document string.
///
/// The `viewBox` matches the image pixel grid. `background`, when given,
/// is drawn as a full-size rectangle beneath the commands; `None` leaves
/// the document transparent.
#[must_use]
pub fn to_svg(
    commands: &[DrawCommand],
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
    background: Option<Color>,
) -> String {
    let doc = build_document(commands, dimensions, metadata, background);
    finish(&doc)
}

/// Serialize a frame, including its overlay when the overlay is visible.
#[must_use]
pub fn frame_to_svg(
    frame: &Frame,
    metadata: &SvgMetadata<'_>,
    background: Option<Color>,
) -> String {
    let mut doc = build_document(&frame.commands, frame.dimensions, metadata, background);
    if frame.overlay.visible {
        doc = doc.add(overlay_group(&frame.overlay));
    }
    finish(&doc)
}

fn build_document(
    commands: &[DrawCommand],
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
    background: Option<Color>,
) -> Document {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(color) = background {
        doc = doc.add(
            Rectangle::new()
                .set("width", w)
                .set("height", h)
                .set("fill", paint(color))
                .set("fill-opacity", opacity(color)),
        );
    }

    for command in commands {
        match command {
            DrawCommand::FilledPolygon {
                boundary,
                fill,
                outline,
            } => {
                let d = build_polygon_data(boundary);
                if d.is_empty() {
                    continue;
                }
                doc = doc.add(
                    Path::new()
                        .set("d", d)
                        .set("fill", paint(*fill))
                        .set("fill-opacity", opacity(*fill))
                        .set("stroke", paint(outline.color))
                        .set("stroke-opacity", opacity(outline.color))
                        .set("stroke-width", outline.width),
                );
            }
            DrawCommand::WeightedPoint { at, color, weight } => {
                if *weight <= 0.0 {
                    continue;
                }
                doc = doc.add(
                    Circle::new()
                        .set("cx", at.x)
                        .set("cy", at.y)
                        .set("r", weight / 2.0)
                        .set("fill", paint(*color))
                        .set("fill-opacity", opacity(*color)),
                );
            }
        }
    }

    doc
}

fn overlay_group(overlay: &Overlay) -> Group {
    let mut group = Group::new().set("id", "overlay");

    for outline in &overlay.hotspots {
        group = group.add(
            Circle::new()
                .set("cx", outline.center.x)
                .set("cy", outline.center.y)
                .set("r", outline.radius)
                .set("fill", "none")
                .set("stroke", paint(OVERLAY_RING_COLOR))
                .set("stroke-width", OVERLAY_RING_WIDTH),
        );
    }

    if let Some((outline, mode)) = highlight_shape(overlay) {
        let circle = Circle::new()
            .set("cx", outline.center.x)
            .set("cy", outline.center.y);
        let highlight = match mode {
            ManipMode::Move => circle
                .set("r", (outline.radius - overlay.ring_thickness / 2.0).max(0.0))
                .set("fill", paint(HIGHLIGHT_COLOR))
                .set("fill-opacity", opacity(HIGHLIGHT_COLOR)),
            ManipMode::Scale => circle
                .set("r", outline.radius)
                .set("fill", "none")
                .set("stroke", paint(HIGHLIGHT_COLOR))
                .set("stroke-opacity", opacity(HIGHLIGHT_COLOR))
                .set("stroke-width", overlay.ring_thickness),
        };
        group = group.add(highlight.set("id", "active-hotspot"));
    }

    group
}

/// The svg crate omits the XML declaration, so we prepend it.
fn finish(doc: &Document) -> String {
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
