//! Pointer interaction: grab, move, and rescale hotspots.
//!
//! While the pointer is up, hovering picks the hotspot under it and the
//! manipulation it would get: the inner disk moves the hotspot, the band
//! just inside its outline rescales it. Pressing locks that choice for
//! the duration of the drag; dragging mutates the locked hotspot and
//! resamples it according to the [`ResamplePolicy`].

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::classify::nearest_hotspot;
use crate::hotspot::{Hotspot, HotspotId};
use crate::types::{Dimensions, PipelineError, Point, ResamplePolicy};

/// What a drag does to the selected hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManipMode {
    /// Set the center to the pointer.
    Move,
    /// Set the radius to the pointer's distance from the center.
    Scale,
}

/// A hotspot picked for manipulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub hotspot: HotspotId,
    pub mode: ManipMode,
}

/// Pick the hotspot and manipulation mode for a pointer position.
///
/// Only hotspots whose disk strictly contains the pointer are candidates
/// and the nearest center wins. With `d` the distance to that center and
/// `r` its radius, the mode is [`ManipMode::Move`] for
/// `d < r - ring_thickness / 2` and [`ManipMode::Scale`] for
/// `d < r + ring_thickness / 2`. Since candidates contain the pointer,
/// scaling is grabbed from the inner half of the ring.
#[must_use]
pub fn select(pointer: Point, hotspots: &[Hotspot], ring_thickness: f64) -> Option<Selection> {
    let (hotspot, d) = nearest_hotspot(pointer, hotspots)?;
    let r = hotspots.get(hotspot.index())?.radius();
    let half = ring_thickness * 0.5;

    let mode = if d < r - half {
        ManipMode::Move
    } else if d < r + half {
        ManipMode::Scale
    } else {
        return None;
    };
    Some(Selection { hotspot, mode })
}

/// Maps canvas coordinates to image space for an image drawn centered
/// in a larger (or smaller) canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub image: Dimensions,
}

impl Viewport {
    /// Convert a canvas position to image space.
    #[must_use]
    pub fn to_image_space(&self, canvas: Point) -> Point {
        Point::new(
            canvas.x + f64::from(self.image.width) / 2.0 - self.canvas_width / 2.0,
            canvas.y + f64::from(self.image.height) / 2.0 - self.canvas_height / 2.0,
        )
    }
}

/// Tracks the active hotspot across hover, press, drag, and release.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionController {
    ring_thickness: f64,
    policy: ResamplePolicy,
    active: Option<Selection>,
    pressed: bool,
    dirty: bool,
}

impl InteractionController {
    /// Create a controller with no active hotspot.
    #[must_use]
    pub const fn new(ring_thickness: f64, policy: ResamplePolicy) -> Self {
        Self {
            ring_thickness,
            policy,
            active: None,
            pressed: false,
            dirty: false,
        }
    }

    /// The currently active selection, if any.
    #[must_use]
    pub const fn active(&self) -> Option<Selection> {
        self.active
    }

    /// Returns `true` between [`press`](Self::press) and
    /// [`release`](Self::release).
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Width of the grab ring.
    #[must_use]
    pub const fn ring_thickness(&self) -> f64 {
        self.ring_thickness
    }

    /// Re-evaluate the selection under a pointer that is not pressed.
    ///
    /// Ignored while a drag is in progress so the grabbed hotspot stays
    /// locked even if the pointer outruns it.
    pub fn hover(&mut self, pointer: Point, hotspots: &[Hotspot]) -> Option<Selection> {
        if !self.pressed {
            self.active = select(pointer, hotspots, self.ring_thickness);
        }
        self.active
    }

    /// Begin a drag at `pointer`, locking the selection under it.
    pub fn press(&mut self, pointer: Point, hotspots: &[Hotspot]) -> Option<Selection> {
        self.pressed = false;
        let selection = self.hover(pointer, hotspots);
        self.pressed = true;
        selection
    }

    /// Apply a drag step to the locked hotspot.
    ///
    /// Returns `Ok(true)` if a hotspot was mutated. Under
    /// [`ResamplePolicy::EveryMove`] the hotspot is resampled with
    /// `spawn_count` points immediately.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidHotspot`] if the pointer is not
    /// finite. The hotspot is left unchanged.
    pub fn drag(
        &mut self,
        pointer: Point,
        hotspots: &mut [Hotspot],
        spawn_count: usize,
        rng: &mut impl Rng,
    ) -> Result<bool, PipelineError> {
        if !self.pressed {
            return Ok(false);
        }
        let Some(selection) = self.active else {
            return Ok(false);
        };
        let Some(hotspot) = hotspots.get_mut(selection.hotspot.index()) else {
            return Ok(false);
        };

        match selection.mode {
            ManipMode::Move => hotspot.set_geometry(pointer, hotspot.radius())?,
            ManipMode::Scale => {
                let center = hotspot.center();
                hotspot.set_geometry(center, pointer.distance(center))?;
            }
        }

        match self.policy {
            ResamplePolicy::EveryMove => hotspot.resample(spawn_count, rng),
            ResamplePolicy::OnRelease => self.dirty = true,
        }
        Ok(true)
    }

    /// End the drag. Resamples the hotspot if its scatter was deferred.
    pub fn release(&mut self, hotspots: &mut [Hotspot], spawn_count: usize, rng: &mut impl Rng) {
        if self.dirty
            && let Some(hotspot) = self
                .active
                .and_then(|s| hotspots.get_mut(s.hotspot.index()))
        {
            hotspot.resample(spawn_count, rng);
        }
        self.dirty = false;
        self.pressed = false;
    }

    /// Forget the active hotspot, e.g. after a portrait switch.
    pub const fn reset(&mut self) {
        self.active = None;
        self.pressed = false;
        self.dirty = false;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    use super::*;
    use crate::types::SamplePoint;

    fn hotspots() -> Vec<Hotspot> {
        vec![
            Hotspot::new(Point::new(100.0, 100.0), 50.0).unwrap(),
            Hotspot::new(Point::new(300.0, 100.0), 80.0).unwrap(),
        ]
    }

    fn within(points: &[SamplePoint], center: Point, radius: f64) -> bool {
        points.iter().all(|p| p.to_point().distance(center) <= radius)
    }

    #[test]
    fn inner_disk_selects_move() {
        let hs = hotspots();
        let sel = select(Point::new(110.0, 100.0), &hs, 20.0).unwrap();
        assert_eq!(
            sel,
            Selection {
                hotspot: HotspotId(0),
                mode: ManipMode::Move
            }
        );
    }

    #[test]
    fn inner_ring_selects_scale() {
        let hs = hotspots();
        // d = 45: between r - 10 = 40 and r = 50.
        let sel = select(Point::new(145.0, 100.0), &hs, 20.0).unwrap();
        assert_eq!(sel.mode, ManipMode::Scale);
    }

    #[test]
    fn outside_every_disk_selects_nothing() {
        let hs = hotspots();
        // d = 55: inside the ring's outer half but outside the disk.
        assert!(select(Point::new(155.0, 100.0), &hs, 20.0).is_none());
        assert!(select(Point::new(500.0, 500.0), &hs, 20.0).is_none());
    }

    #[test]
    fn viewport_centers_image_in_canvas() {
        let viewport = Viewport {
            canvas_width: 800.0,
            canvas_height: 600.0,
            image: Dimensions {
                width: 400,
                height: 200,
            },
        };
        assert_eq!(
            viewport.to_image_space(Point::new(200.0, 200.0)),
            Point::new(0.0, 0.0)
        );
        assert_eq!(
            viewport.to_image_space(Point::new(400.0, 300.0)),
            Point::new(200.0, 100.0)
        );
    }

    #[test]
    fn hover_is_frozen_while_pressed() {
        let hs = hotspots();
        let mut ctl = InteractionController::new(20.0, ResamplePolicy::EveryMove);
        ctl.press(Point::new(100.0, 100.0), &hs);
        let locked = ctl.active();
        assert!(locked.is_some());
        assert_eq!(ctl.hover(Point::new(900.0, 900.0), &hs), locked);
    }

    #[test]
    fn move_drag_relocates_and_resamples() {
        let mut hs = hotspots();
        let mut rng = Pcg64::seed_from_u64(0);
        let mut ctl = InteractionController::new(20.0, ResamplePolicy::EveryMove);

        ctl.press(Point::new(100.0, 100.0), &hs);
        assert!(ctl.drag(Point::new(400.0, 250.0), &mut hs, 200, &mut rng).unwrap());

        let moved = &hs[0];
        assert_eq!(moved.center(), Point::new(400.0, 250.0));
        assert!((moved.radius() - 50.0).abs() < f64::EPSILON);
        assert_eq!(moved.points().len(), 200);
        assert!(within(moved.points(), moved.center(), moved.radius()));
    }

    #[test]
    fn move_drag_to_fractional_target_keeps_points_in_disk() {
        let mut hs = vec![Hotspot::new(Point::new(50.0, 50.0), 4.5).unwrap()];
        let mut rng = Pcg64::seed_from_u64(3);
        let mut ctl = InteractionController::new(1.0, ResamplePolicy::EveryMove);

        ctl.press(Point::new(50.0, 50.0), &hs);
        assert!(ctl.drag(Point::new(10.7, 10.7), &mut hs, 2000, &mut rng).unwrap());

        let moved = &hs[0];
        assert_eq!(moved.center(), Point::new(10.7, 10.7));
        assert_eq!(moved.points().len(), 2000);
        assert!(within(moved.points(), moved.center(), moved.radius()));
    }

    #[test]
    fn scale_drag_sets_radius_from_center() {
        let mut hs = hotspots();
        let mut rng = Pcg64::seed_from_u64(1);
        let mut ctl = InteractionController::new(20.0, ResamplePolicy::EveryMove);

        ctl.press(Point::new(145.0, 100.0), &hs);
        ctl.drag(Point::new(100.0, 170.0), &mut hs, 10, &mut rng).unwrap();

        assert_eq!(hs[0].center(), Point::new(100.0, 100.0));
        assert!((hs[0].radius() - 70.0).abs() < 1e-12);
    }

    #[test]
    fn drag_without_press_does_nothing() {
        let mut hs = hotspots();
        let before = hs.clone();
        let mut ctl = InteractionController::new(20.0, ResamplePolicy::EveryMove);
        ctl.hover(Point::new(100.0, 100.0), &hs);
        let changed = ctl
            .drag(Point::new(0.0, 0.0), &mut hs, 10, &mut Pcg64::seed_from_u64(2))
            .unwrap();
        assert!(!changed);
        assert_eq!(hs, before);
    }

    #[test]
    fn press_on_empty_space_drags_nothing() {
        let mut hs = hotspots();
        let mut ctl = InteractionController::new(20.0, ResamplePolicy::EveryMove);
        ctl.press(Point::new(700.0, 700.0), &hs);
        let changed = ctl
            .drag(Point::new(0.0, 0.0), &mut hs, 10, &mut Pcg64::seed_from_u64(3))
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn on_release_policy_defers_resample() {
        let mut hs = hotspots();
        let mut rng = Pcg64::seed_from_u64(4);
        hs[0].resample(30, &mut rng);
        let before = hs[0].points().to_vec();

        let mut ctl = InteractionController::new(20.0, ResamplePolicy::OnRelease);
        ctl.press(Point::new(100.0, 100.0), &hs);
        ctl.drag(Point::new(250.0, 250.0), &mut hs, 30, &mut rng).unwrap();
        assert_eq!(hs[0].points(), before.as_slice());

        ctl.release(&mut hs, 30, &mut rng);
        assert!(!ctl.is_pressed());
        assert_eq!(hs[0].points().len(), 30);
        assert!(within(hs[0].points(), Point::new(250.0, 250.0), 50.0));
    }

    #[test]
    fn non_finite_pointer_is_rejected() {
        let mut hs = hotspots();
        let mut ctl = InteractionController::new(20.0, ResamplePolicy::EveryMove);
        ctl.press(Point::new(100.0, 100.0), &hs);
        let result = ctl.drag(
            Point::new(f64::NAN, 0.0),
            &mut hs,
            10,
            &mut Pcg64::seed_from_u64(5),
        );
        assert!(matches!(result, Err(PipelineError::InvalidHotspot(_))));
        assert_eq!(hs[0].center(), Point::new(100.0, 100.0));
    }
}
