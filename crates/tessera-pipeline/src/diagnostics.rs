//! Frame diagnostics: timing and counts for each pipeline stage.
//!
//! Every frame rendered by a [`Session`](crate::Session) carries a
//! [`FrameDiagnostics`] so callers can see where time goes and how many
//! points survive each stage while tuning counts and falloff.
//!
//! Timestamps are captured via the `web-time` crate, which uses
//! `performance.now()` on WASM and `std::time::Instant` on native.
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::ClassifyStats;
use crate::render::RenderStats;
use crate::types::Dimensions;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDiagnostics {
    /// Size of the portrait the frame was rendered from.
    pub dimensions: Dimensions,
    /// Stage 1: combine scatters and classify.
    pub classify: StageDiagnostics,
    /// Stage 2: diagram construction.
    pub diagram: StageDiagnostics,
    /// Stage 3: per-cell render decisions.
    pub render: StageDiagnostics,
    /// Wall-clock duration of the whole frame (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific counts.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Point classification counts.
    Classify(ClassifyStats),
    /// Diagram construction counts.
    Diagram {
        /// Sites submitted to the builder.
        sites: usize,
        /// Cells returned, degenerate ones included.
        cells: usize,
    },
    /// Render decision counts.
    Render(RenderStats),
}

impl FrameDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Frame Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{}",
            self.dimensions.width, self.dimensions.height,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Classify", &self.classify),
            ("Diagram", &self.diagram),
            ("Render", &self.render),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Classify(stats) => format!(
            "{} pts, {} out of bounds, {} unassociated -> {} sites",
            stats.input, stats.out_of_bounds, stats.unassociated, stats.classified,
        ),
        StageMetrics::Diagram { sites, cells } => format!("{sites} sites -> {cells} cells"),
        StageMetrics::Render(stats) => format!(
            "{} cells: {} filled, {} stippled, {} skipped, {} degenerate",
            stats.cells, stats.filled, stats.stippled, stats.skipped, stats.degenerate,
        ),
    }
}
