//! The rendering session: portraits, hotspots, and per-frame pipeline.
//!
//! A [`Session`] is the explicit context object holding everything that
//! lives across frames: the loaded portraits and which one is shown, the
//! hotspots and their scatters, the cached background scatter, the
//! interaction controller, the diagram builder, the RNG, and the last
//! frame that rendered successfully.
//!
//! # Frame pipeline
//!
//! 1. Chain the background scatter with every hotspot's scatter
//! 2. [`classify`](crate::classify::classify) against the portrait
//! 3. Build the diagram through the [`DiagramAdapter`]
//! 4. [`render_cells`](crate::render::render_cells) into draw commands
//!
//! A failed diagram build fails only that frame: the session logs a
//! warning and serves the previous frame if there is one.

use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::background;
use crate::classify::classify;
use crate::diagnostics::{FrameDiagnostics, StageDiagnostics, StageMetrics};
use crate::diagram::{DiagramAdapter, DiagramBuilder};
use crate::hotspot::Hotspot;
use crate::interaction::{InteractionController, Selection};
use crate::preset::PresetTable;
use crate::render::{DrawCommand, render_cells};
use crate::types::{Dimensions, PipelineError, Point, RgbaImage, SamplePoint, SessionConfig};

/// A named source image.
///
/// The name is the key used to look up the portrait's preset, so it is
/// typically the file name (`walter.jpg`).
#[derive(Debug, Clone, PartialEq)]
pub struct Portrait {
    pub name: String,
    pub image: RgbaImage,
}

impl Portrait {
    /// Pair an image with its preset key.
    #[must_use]
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }

    /// Pixel size of the image.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.image.width(),
            height: self.image.height(),
        }
    }
}

/// Center and radius of one hotspot, as drawn by an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HotspotOutline {
    pub center: Point,
    pub radius: f64,
}

/// Hotspot outlines and the active selection for an on-canvas overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// Every hotspot, in id order.
    pub hotspots: Vec<HotspotOutline>,
    /// The hotspot under (or grabbed by) the pointer.
    pub active: Option<Selection>,
    /// Width of the grab ring, used to draw the scale highlight.
    pub ring_thickness: f64,
    /// Whether the overlay is toggled on.
    pub visible: bool,
}

/// Everything a presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Size of the portrait the frame was rendered from.
    pub dimensions: Dimensions,
    /// Draw commands in cell order.
    pub commands: Vec<DrawCommand>,
    /// Hotspot overlay state at render time.
    pub overlay: Overlay,
    /// Timing and counts.
    pub diagnostics: FrameDiagnostics,
}

/// A rendering session over one or more portraits.
#[derive(Debug)]
pub struct Session<B> {
    portraits: Vec<Portrait>,
    current: usize,
    hotspots: Vec<Hotspot>,
    background: Vec<SamplePoint>,
    config: SessionConfig,
    controller: InteractionController,
    adapter: DiagramAdapter<B>,
    rng: Pcg64,
    presets: PresetTable,
    overlay_visible: bool,
    last_frame: Option<Frame>,
}

impl<B: DiagramBuilder> Session<B> {
    /// Start a session on the first portrait.
    ///
    /// Creates `config.hotspot_count` hotspots, applies the first
    /// portrait's preset if `presets` has one, resamples every hotspot,
    /// and scatters the background.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for an invalid config,
    /// [`PipelineError::NoPortraits`] if `portraits` is empty,
    /// [`PipelineError::EmptyImage`] if the first portrait has a zero
    /// side, or [`PipelineError::InvalidHotspot`] if its preset holds an
    /// invalid triple.
    pub fn new(
        portraits: Vec<Portrait>,
        config: SessionConfig,
        presets: PresetTable,
        builder: B,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        if portraits.is_empty() {
            return Err(PipelineError::NoPortraits);
        }

        let rng = config
            .seed
            .map_or_else(Pcg64::from_entropy, Pcg64::seed_from_u64);

        let mut session = Self {
            portraits,
            current: 0,
            hotspots: vec![Hotspot::default(); config.hotspot_count],
            background: Vec::new(),
            controller: InteractionController::new(config.ring_thickness, config.resample_policy),
            config,
            adapter: DiagramAdapter::new(builder),
            rng,
            presets,
            overlay_visible: false,
            last_frame: None,
        };
        session.enter_portrait()?;
        Ok(session)
    }

    /// The portrait currently shown.
    #[must_use]
    pub fn portrait(&self) -> &Portrait {
        &self.portraits[self.current]
    }

    /// Index of the current portrait.
    #[must_use]
    pub const fn portrait_index(&self) -> usize {
        self.current
    }

    /// The hotspots, indexed by [`HotspotId`](crate::HotspotId).
    #[must_use]
    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    /// The cached background scatter for the current portrait.
    #[must_use]
    pub fn background(&self) -> &[SamplePoint] {
        &self.background
    }

    /// The session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The hotspot under or grabbed by the pointer.
    #[must_use]
    pub const fn active(&self) -> Option<Selection> {
        self.controller.active()
    }

    /// Whether the hotspot overlay is toggled on.
    #[must_use]
    pub const fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// The most recent successfully rendered frame.
    #[must_use]
    pub const fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Mutable access to the diagram builder.
    pub const fn diagram_builder_mut(&mut self) -> &mut B {
        self.adapter.builder_mut()
    }

    /// Advance to the next portrait, wrapping after the last.
    ///
    /// Regenerates the background scatter, re-applies the portrait's
    /// preset, resamples every hotspot, and drops the active selection.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyImage`] if the next portrait has a
    /// zero side, or [`PipelineError::InvalidHotspot`] for an invalid
    /// preset. The session still points at the new portrait.
    pub fn next_portrait(&mut self) -> Result<(), PipelineError> {
        self.current = (self.current + 1) % self.portraits.len();
        self.enter_portrait()
    }

    /// Restore the current portrait's preset geometry and resample.
    ///
    /// Without a preset every hotspot returns to its default geometry.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidHotspot`] for an invalid preset.
    pub fn reset_hotspots(&mut self) -> Result<(), PipelineError> {
        self.controller.reset();
        self.apply_preset()?;
        self.resample_all();
        Ok(())
    }

    /// Flip overlay visibility and return the new state.
    pub const fn toggle_overlay(&mut self) -> bool {
        self.overlay_visible = !self.overlay_visible;
        self.overlay_visible
    }

    /// Pointer moved with no button held, in image coordinates.
    pub fn pointer_hover(&mut self, pointer: Point) -> Option<Selection> {
        self.controller.hover(pointer, &self.hotspots)
    }

    /// Pointer pressed, in image coordinates. Locks the selection.
    pub fn pointer_press(&mut self, pointer: Point) -> Option<Selection> {
        self.controller.press(pointer, &self.hotspots)
    }

    /// Pointer dragged, in image coordinates.
    ///
    /// Returns `Ok(true)` if a hotspot moved or resized.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidHotspot`] for a non-finite
    /// pointer.
    pub fn pointer_drag(&mut self, pointer: Point) -> Result<bool, PipelineError> {
        self.controller.drag(
            pointer,
            &mut self.hotspots,
            self.config.spawn_count,
            &mut self.rng,
        )
    }

    /// Pointer released.
    pub fn pointer_release(&mut self) {
        self.controller
            .release(&mut self.hotspots, self.config.spawn_count, &mut self.rng);
    }

    /// Run the pipeline for the current state and keep the result as the
    /// last valid frame.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Diagram`] if the diagram build fails and
    /// no earlier frame exists; with an earlier frame, that frame is
    /// returned instead.
    pub fn render_frame(&mut self) -> Result<&Frame, PipelineError> {
        let total_start = Instant::now();
        let portrait = &self.portraits[self.current];
        let dimensions = portrait.dimensions();

        // Stage 1: classify
        let start = Instant::now();
        let samples = self
            .background
            .iter()
            .chain(self.hotspots.iter().flat_map(Hotspot::points));
        let classification = classify(samples, &portrait.image, &self.hotspots)?;
        let classify_stage = StageDiagnostics {
            duration: start.elapsed(),
            metrics: StageMetrics::Classify(classification.stats),
        };

        // Stage 2: diagram
        let start = Instant::now();
        let cells = match self.adapter.build(&classification.points, dimensions) {
            Ok(cells) => cells,
            Err(err) => {
                log::warn!("frame failed, keeping previous frame: {err}");
                return self.last_frame.as_ref().ok_or(PipelineError::Diagram(err));
            }
        };
        let diagram_stage = StageDiagnostics {
            duration: start.elapsed(),
            metrics: StageMetrics::Diagram {
                sites: classification.points.len(),
                cells: cells.len(),
            },
        };

        // Stage 3: render decisions
        let start = Instant::now();
        let (commands, render_stats) = render_cells(&cells, &self.hotspots, self.config.falloff);
        let render_stage = StageDiagnostics {
            duration: start.elapsed(),
            metrics: StageMetrics::Render(render_stats),
        };

        log::debug!(
            "frame {}: {} samples, {} sites, {} filled, {} stippled, {} skipped",
            portrait.name,
            classification.stats.input,
            classification.stats.classified,
            render_stats.filled,
            render_stats.stippled,
            render_stats.skipped,
        );

        let frame = Frame {
            dimensions,
            commands,
            overlay: self.overlay(),
            diagnostics: FrameDiagnostics {
                dimensions,
                classify: classify_stage,
                diagram: diagram_stage,
                render: render_stage,
                total_duration: total_start.elapsed(),
            },
        };
        Ok(&*self.last_frame.insert(frame))
    }

    /// Current overlay state.
    #[must_use]
    pub fn overlay(&self) -> Overlay {
        Overlay {
            hotspots: self
                .hotspots
                .iter()
                .map(|h| HotspotOutline {
                    center: h.center(),
                    radius: h.radius(),
                })
                .collect(),
            active: self.controller.active(),
            ring_thickness: self.controller.ring_thickness(),
            visible: self.overlay_visible,
        }
    }

    fn enter_portrait(&mut self) -> Result<(), PipelineError> {
        let dimensions = self.portrait().dimensions();
        self.background =
            background::generate(dimensions, self.config.background_count, &mut self.rng)?;
        self.last_frame = None;
        log::debug!(
            "portrait {} ({}x{}): {} background points",
            self.portrait().name,
            dimensions.width,
            dimensions.height,
            self.background.len(),
        );
        self.reset_hotspots()
    }

    fn apply_preset(&mut self) -> Result<(), PipelineError> {
        let name = &self.portraits[self.current].name;
        if let Some(preset) = self.presets.get(name) {
            preset.apply(&mut self.hotspots)
        } else {
            log::debug!("no preset for {name}, using default hotspot geometry");
            for hotspot in &mut self.hotspots {
                *hotspot = Hotspot::default();
            }
            Ok(())
        }
    }

    fn resample_all(&mut self) {
        for hotspot in &mut self.hotspots {
            hotspot.resample(self.config.spawn_count, &mut self.rng);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::diagram::DiagramError;
    use crate::diagram::tests::FakeBuilder;
    use crate::hotspot::HotspotId;
    use crate::interaction::ManipMode;
    use crate::preset::Preset;

    fn portrait(name: &str, width: u32, height: u32) -> Portrait {
        Portrait::new(
            name,
            RgbaImage::from_fn(width, height, |x, y| {
                Rgba([
                    u8::try_from(x % 256).unwrap(),
                    u8::try_from(y % 256).unwrap(),
                    128,
                    255,
                ])
            }),
        )
    }

    fn presets() -> PresetTable {
        let mut table = PresetTable::default();
        table
            .0
            .insert("a.png".to_owned(), Preset(vec![[50.0, 50.0, 20.0]]));
        table
            .0
            .insert("b.png".to_owned(), Preset(vec![[30.0, 40.0, 10.0]]));
        table
    }

    fn config() -> SessionConfig {
        SessionConfig {
            hotspot_count: 1,
            spawn_count: 200,
            background_count: 100,
            seed: Some(7),
            ..SessionConfig::default()
        }
    }

    fn session() -> Session<FakeBuilder> {
        Session::new(
            vec![portrait("a.png", 100, 100), portrait("b.png", 60, 80)],
            config(),
            presets(),
            FakeBuilder::default(),
        )
        .unwrap()
    }

    #[test]
    fn new_applies_preset_and_scatters() {
        let s = session();
        assert_eq!(s.hotspots().len(), 1);
        assert_eq!(s.hotspots()[0].center(), Point::new(50.0, 50.0));
        assert_eq!(s.hotspots()[0].points().len(), 200);
        assert_eq!(s.background().len(), 100);
        assert!(!s.overlay_visible());
    }

    #[test]
    fn no_portraits_is_an_error() {
        let result = Session::new(
            Vec::new(),
            config(),
            presets(),
            FakeBuilder::default(),
        );
        assert!(matches!(result, Err(PipelineError::NoPortraits)));
    }

    #[test]
    fn invalid_config_is_an_error() {
        let bad = SessionConfig {
            falloff: 2.0,
            ..config()
        };
        let result = Session::new(
            vec![portrait("a.png", 10, 10)],
            bad,
            presets(),
            FakeBuilder::default(),
        );
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn empty_portrait_is_an_error() {
        let result = Session::new(
            vec![portrait("a.png", 0, 10)],
            config(),
            presets(),
            FakeBuilder::default(),
        );
        assert!(matches!(result, Err(PipelineError::EmptyImage { .. })));
    }

    #[test]
    fn frame_only_draws_inside_the_hotspot() {
        let mut s = session();
        let frame = s.render_frame().unwrap();
        assert!(!frame.commands.is_empty());

        let center = Point::new(50.0, 50.0);
        for command in &frame.commands {
            match command {
                DrawCommand::FilledPolygon { boundary, .. } => {
                    // Fake cells are 2x2 squares around the site.
                    let site = Point::new(boundary[0].x + 1.0, boundary[0].y + 1.0);
                    assert!(site.distance(center) < 20.0 * 0.6);
                }
                DrawCommand::WeightedPoint { at, weight, .. } => {
                    let d = at.distance(center);
                    assert!((12.0..20.0).contains(&d), "stipple at {d}");
                    assert!((0.0..=10.0).contains(weight));
                }
            }
        }

        let StageMetrics::Classify(stats) = frame.diagnostics.classify.metrics else {
            unreachable!("classify stage carries classify metrics");
        };
        assert_eq!(stats.input, 300);
        assert_eq!(
            stats.input,
            stats.out_of_bounds + stats.unassociated + stats.classified
        );
    }

    #[test]
    fn failed_build_serves_previous_frame() {
        let mut s = session();
        let first = s.render_frame().unwrap().clone();
        s.diagram_builder_mut().fail = Some(DiagramError::Failed("boom".to_owned()));
        let second = s.render_frame().unwrap();
        assert_eq!(second, &first);
    }

    #[test]
    fn failed_first_build_is_an_error() {
        let mut s = session();
        s.diagram_builder_mut().fail = Some(DiagramError::Failed("boom".to_owned()));
        let before = s.hotspots().to_vec();
        assert!(matches!(s.render_frame(), Err(PipelineError::Diagram(_))));
        assert_eq!(s.hotspots(), before.as_slice());
    }

    #[test]
    fn next_portrait_wraps_and_applies_presets() {
        let mut s = session();
        s.render_frame().unwrap();

        s.next_portrait().unwrap();
        assert_eq!(s.portrait_index(), 1);
        assert_eq!(s.hotspots()[0].center(), Point::new(30.0, 40.0));
        assert!(s.last_frame().is_none());
        assert_eq!(s.render_frame().unwrap().dimensions.width, 60);

        s.next_portrait().unwrap();
        assert_eq!(s.portrait_index(), 0);
        assert_eq!(s.hotspots()[0].center(), Point::new(50.0, 50.0));
    }

    #[test]
    fn missing_preset_uses_default_geometry() {
        let s = Session::new(
            vec![portrait("unknown.png", 20, 20)],
            config(),
            presets(),
            FakeBuilder::default(),
        )
        .unwrap();
        let hotspot = &s.hotspots()[0];
        assert_eq!(hotspot.center(), Hotspot::default().center());
        assert!((hotspot.radius() - Hotspot::default().radius()).abs() < f64::EPSILON);
        assert_eq!(hotspot.points().len(), 200);
    }

    #[test]
    fn drag_then_reset_restores_preset() {
        let mut s = session();
        assert_eq!(
            s.pointer_press(Point::new(50.0, 50.0)),
            Some(Selection {
                hotspot: HotspotId(0),
                mode: ManipMode::Move,
            })
        );
        assert!(s.pointer_drag(Point::new(70.0, 60.0)).unwrap());
        s.pointer_release();
        assert_eq!(s.hotspots()[0].center(), Point::new(70.0, 60.0));
        assert_eq!(s.hotspots()[0].points().len(), 200);

        s.reset_hotspots().unwrap();
        assert_eq!(s.hotspots()[0].center(), Point::new(50.0, 50.0));
        assert!(s.active().is_none());
    }

    #[test]
    fn overlay_reflects_toggle_and_selection() {
        let mut s = session();
        assert!(s.toggle_overlay());
        s.pointer_hover(Point::new(50.0, 50.0));
        let frame = s.render_frame().unwrap();
        assert!(frame.overlay.visible);
        assert!((frame.overlay.hotspots[0].radius - 20.0).abs() < f64::EPSILON);
        assert_eq!(frame.overlay.active.unwrap().mode, ManipMode::Move);
        assert!(!s.toggle_overlay());
    }

    #[test]
    fn same_seed_same_frame() {
        let mut a = session();
        let mut b = session();
        assert_eq!(
            a.render_frame().unwrap().commands,
            b.render_frame().unwrap().commands
        );
    }
}
