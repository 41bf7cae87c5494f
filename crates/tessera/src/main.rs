//! tessera: render portraits as Voronoi cells and stipples.
//!
//! Loads one or more portraits, places hotspots from presets (built-in or
//! a JSON file), optionally replays pointer drags to move or resize
//! hotspots, and writes one PNG or SVG per portrait along with per-frame
//! diagnostics.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin tessera -- [OPTIONS] <PORTRAITS>...
//! ```
//!
//! Set `RUST_LOG=debug` for per-frame counts.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tessera_pipeline::{
    ClippedVoronoi, Frame, Point, Portrait, PresetTable, ResamplePolicy, Session, SessionConfig,
};

/// Render portraits as filled Voronoi cells and stipples around hotspots.
#[derive(Parser)]
#[command(name = "tessera", version)]
struct Cli {
    /// Portrait images (PNG, JPEG, BMP, WebP), rendered in order.
    #[arg(required = true)]
    portraits: Vec<PathBuf>,

    /// Directory the rendered files are written to.
    #[arg(long, short, default_value = ".")]
    output: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Png)]
    format: Format,

    /// RNG seed for reproducible scatters. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of a hotspot radius below which cells are filled (0.0-1.0).
    #[arg(long, default_value_t = SessionConfig::DEFAULT_FALLOFF)]
    falloff: f64,

    /// Number of hotspots.
    #[arg(long, default_value_t = SessionConfig::DEFAULT_HOTSPOT_COUNT, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    hotspot_count: usize,

    /// Sample points per hotspot.
    #[arg(long, default_value_t = SessionConfig::DEFAULT_SPAWN_COUNT)]
    spawn_count: usize,

    /// Uniform background sample points per portrait.
    #[arg(long, default_value_t = SessionConfig::DEFAULT_BACKGROUND_COUNT)]
    background_count: usize,

    /// Width of the grab ring around each hotspot outline, in pixels.
    #[arg(long, default_value_t = SessionConfig::DEFAULT_RING_THICKNESS)]
    ring_thickness: f64,

    /// When a dragged hotspot regenerates its sample points.
    #[arg(long, value_enum, default_value_t = Resample::EveryMove)]
    resample: Resample,

    /// JSON file of hotspot presets, merged over the built-in table.
    ///
    /// Maps portrait file names to `[x, y, radius]` triples.
    #[arg(long)]
    presets: Option<PathBuf>,

    /// Full session config as a JSON string.
    ///
    /// When provided, all other session parameter flags are ignored.
    /// The JSON must be a valid `SessionConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Pointer drag in image coordinates, `X0,Y0:X1,Y1`.
    ///
    /// Replayed in order on every portrait before rendering: press at
    /// the first point, drag to the second, release.
    #[arg(long = "drag", value_parser = parse_drag)]
    drags: Vec<Drag>,

    /// Draw hotspot outlines and the active-hotspot highlight.
    #[arg(long)]
    overlay: bool,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,
}

/// Output format selection.
#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Anti-aliased raster image.
    Png,
    /// Vector document.
    Svg,
}

impl Format {
    const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// Resample policy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Resample {
    /// Resample on every drag step.
    EveryMove,
    /// Resample once on release.
    OnRelease,
}

/// A press-drag-release gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    from: Point,
    to: Point,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x: f64 = x
        .trim()
        .parse()
        .map_err(|e| format!("bad x coordinate {x:?}: {e}"))?;
    let y: f64 = y
        .trim()
        .parse()
        .map_err(|e| format!("bad y coordinate {y:?}: {e}"))?;
    Ok(Point::new(x, y))
}

fn parse_drag(s: &str) -> Result<Drag, String> {
    let (from, to) = s
        .split_once(':')
        .ok_or_else(|| format!("expected X0,Y0:X1,Y1, got {s:?}"))?;
    Ok(Drag {
        from: parse_point(from)?,
        to: parse_point(to)?,
    })
}

/// Build a [`SessionConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<SessionConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        SessionConfig {
            hotspot_count: cli.hotspot_count,
            spawn_count: cli.spawn_count,
            background_count: cli.background_count,
            falloff: cli.falloff,
            ring_thickness: cli.ring_thickness,
            resample_policy: match cli.resample {
                Resample::EveryMove => ResamplePolicy::EveryMove,
                Resample::OnRelease => ResamplePolicy::OnRelease,
            },
            seed: cli.seed,
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn load_presets(path: Option<&Path>) -> Result<PresetTable, Box<dyn Error>> {
    let mut presets = PresetTable::builtin();
    if let Some(path) = path {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
        let extra: PresetTable = serde_json::from_str(&json)
            .map_err(|e| format!("Error parsing {}: {e}", path.display()))?;
        log::info!("loaded {} presets from {}", extra.0.len(), path.display());
        presets.extend(extra);
    }
    Ok(presets)
}

fn load_portrait(path: &Path) -> Result<Portrait, Box<dyn Error>> {
    let image = image::open(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?
        .to_rgba8();
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("portrait")
        .to_owned();
    log::info!("loaded {name}: {}x{}", image.width(), image.height());
    Ok(Portrait::new(name, image))
}

fn replay_drags(session: &mut Session<ClippedVoronoi>, drags: &[Drag]) -> Result<(), Box<dyn Error>> {
    for drag in drags {
        let Some(selection) = session.pointer_press(drag.from) else {
            log::warn!(
                "no hotspot under ({}, {}), drag ignored",
                drag.from.x,
                drag.from.y
            );
            session.pointer_release();
            continue;
        };
        log::debug!("drag {:?} hotspot {}", selection.mode, selection.hotspot.index());
        session.pointer_drag(drag.to)?;
        session.pointer_release();
    }
    Ok(())
}

fn write_frame(
    frame: &Frame,
    format: Format,
    path: &Path,
    title: &str,
    description: &str,
) -> Result<(), Box<dyn Error>> {
    let background = Some(tessera_export::DEFAULT_BACKGROUND);
    match format {
        Format::Png => {
            let image = tessera_export::rasterize_frame(frame, background)?;
            image.save(path)?;
        }
        Format::Svg => {
            let metadata = tessera_export::SvgMetadata {
                title: Some(title),
                description: Some(description),
            };
            let svg = tessera_export::frame_to_svg(frame, &metadata, background);
            std::fs::write(path, svg)?;
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = config_from_cli(cli)?;
    let presets = load_presets(cli.presets.as_deref())?;
    let portraits = cli
        .portraits
        .iter()
        .map(|p| load_portrait(p))
        .collect::<Result<Vec<_>, _>>()?;

    std::fs::create_dir_all(&cli.output)
        .map_err(|e| format!("Error creating {}: {e}", cli.output.display()))?;

    let description = serde_json::to_string(&config)?;
    let count = portraits.len();
    let mut session = Session::new(portraits, config, presets, ClippedVoronoi::new())?;
    if cli.overlay {
        session.toggle_overlay();
    }

    for i in 0..count {
        if i > 0 {
            session.next_portrait()?;
        }
        replay_drags(&mut session, &cli.drags)?;

        let name = session.portrait().name.clone();
        let stem = Path::new(&name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("portrait")
            .to_owned();
        let frame = session.render_frame()?;

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&frame.diagnostics)?);
        } else {
            println!("{name}\n{}\n", frame.diagnostics.report());
        }

        let path = cli
            .output
            .join(format!("{stem}.{}", cli.format.extension()));
        write_frame(frame, cli.format, &path, &stem, &description)?;
        log::info!("{name} written to {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn drag_parses_two_points() {
        assert_eq!(
            parse_drag("10,20:30.5, 40").unwrap(),
            Drag {
                from: Point::new(10.0, 20.0),
                to: Point::new(30.5, 40.0),
            }
        );
    }

    #[test]
    fn drag_without_separator_is_rejected() {
        assert!(parse_drag("10,20").is_err());
        assert!(parse_drag("10:20").is_err());
        assert!(parse_drag("a,1:2,3").is_err());
    }

    #[test]
    fn flags_build_config() {
        let cli = Cli::parse_from([
            "tessera",
            "--seed",
            "5",
            "--falloff",
            "0.4",
            "--resample",
            "on-release",
            "--drag",
            "1,2:3,4",
            "a.png",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.seed, Some(5));
        assert!((config.falloff - 0.4).abs() < f64::EPSILON);
        assert_eq!(config.resample_policy, ResamplePolicy::OnRelease);
        assert_eq!(cli.drags.len(), 1);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = Cli::parse_from([
            "tessera",
            "--falloff",
            "0.4",
            "--config-json",
            r#"{"falloff": 0.9, "hotspot_count": 2}"#,
            "a.png",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert!((config.falloff - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.hotspot_count, 2);
        assert_eq!(config.spawn_count, SessionConfig::DEFAULT_SPAWN_COUNT);
    }

    #[test]
    fn invalid_falloff_is_rejected() {
        let cli = Cli::parse_from(["tessera", "--falloff", "1.5", "a.png"]);
        assert!(config_from_cli(&cli).is_err());
    }
}
