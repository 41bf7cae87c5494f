//! Hotspot presets: stored `[x, y, radius]` triples per portrait.
//!
//! Presets are plain JSON so they can live next to the portraits:
//!
//! ```json
//! {
//!   "walter.jpg": [[365, 230, 210], [300, 130, 150], [175, 315, 200], [500, 340, 170]]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hotspot::Hotspot;
use crate::types::{PipelineError, Point};

/// Hotspot geometries for one portrait, one `[x, y, radius]` per hotspot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preset(pub Vec<[f64; 3]>);

impl Preset {
    /// Reset the leading hotspots to this preset's geometry.
    ///
    /// Only geometry changes; callers resample afterwards. If the counts
    /// differ, the shorter of the two wins and the mismatch is logged.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidHotspot`] on the first triple with
    /// a negative or non-finite radius. Hotspots before it have already
    /// been updated.
    pub fn apply(&self, hotspots: &mut [Hotspot]) -> Result<(), PipelineError> {
        if self.0.len() != hotspots.len() {
            log::warn!(
                "preset has {} hotspots but the session has {}; applying {}",
                self.0.len(),
                hotspots.len(),
                self.0.len().min(hotspots.len()),
            );
        }
        for (hotspot, &[x, y, radius]) in hotspots.iter_mut().zip(&self.0) {
            hotspot.set_geometry(Point::new(x, y), radius)?;
        }
        Ok(())
    }
}

/// Presets keyed by portrait name (typically the file name).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetTable(pub BTreeMap<String, Preset>);

impl PresetTable {
    /// The presets tuned for the stock portraits.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = [
            (
                "walter.jpg",
                [
                    [365.0, 230.0, 210.0],
                    [300.0, 130.0, 150.0],
                    [175.0, 315.0, 200.0],
                    [500.0, 340.0, 170.0],
                ],
            ),
            (
                "clint.jpg",
                [
                    [440.0, 230.0, 220.0],
                    [280.0, 215.0, 150.0],
                    [315.0, 340.0, 150.0],
                    [115.0, 170.0, 120.0],
                ],
            ),
            (
                "snake.jpg",
                [
                    [660.0, 240.0, 240.0],
                    [360.0, 120.0, 150.0],
                    [230.0, 65.0, 200.0],
                    [485.0, 250.0, 185.0],
                ],
            ),
        ];
        Self(
            entries
                .into_iter()
                .map(|(name, triples)| (name.to_owned(), Preset(triples.to_vec())))
                .collect(),
        )
    }

    /// Look up the preset for a portrait name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.0.get(name)
    }

    /// Add entries from `other`, replacing presets with the same name.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }
}
