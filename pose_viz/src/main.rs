mod scene;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use kiss3d::camera::ArcBall;
use kiss3d::event::{Action, Key, WindowEvent};
use kiss3d::light::Light;
use kiss3d::text::Font;
use kiss3d::window::Window;
use nalgebra::{Point2, Point3, Vector3};
use pose_km::catalog::{self, JOINTS};
use pose_km::controller::{Controller, RedrawInfo};
use pose_km::loader::{load_selection, Layout, Selection};
use pose_km::stats::{compute_label_statistics, LabelStatistic, Summary};
use pose_km::table::{format_stamp, Axis};
use pose_km::{render_summary, ViewerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scene::{draw_ground_grid, BarOverlay, PointCloud};

const USAGE: &str = "Usage: pose_viz [base] [sub] [--config FILE] \
                     [--layout per_label|label_prefixed] [--remap xz-y] [--joint NAME] \
                     [--no-ranges] [--catalog]";

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

struct Args {
    positional: Vec<String>,
    config: PathBuf,
    layout: Option<Layout>,
    remap: Option<String>,
    /// Draw only this joint; statistics still cover the whole catalog.
    joint: Option<usize>,
    no_ranges: bool,
    catalog: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args {
        positional: Vec::new(),
        config: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/config/viewer.json")),
        layout: None,
        remap: None,
        joint: None,
        no_ranges: false,
        catalog: false,
    };
    while let Some(a) = args.next() {
        let mut value =
            |flag: &str| args.next().with_context(|| format!("{flag} requires a value"));
        match a.as_str() {
            "--config" => parsed.config = PathBuf::from(value("--config")?),
            "--layout" => {
                let v = value("--layout")?;
                parsed.layout = Some(v.parse().map_err(anyhow::Error::msg)?);
            }
            "--remap" => parsed.remap = Some(value("--remap")?),
            "--joint" => {
                let name = value("--joint")?;
                let index = catalog::find_joint(&name)
                    .with_context(|| format!("unknown joint '{name}', see --catalog"))?;
                parsed.joint = Some(index);
            }
            "--no-ranges" => parsed.no_ranges = true,
            "--catalog" => parsed.catalog = true,
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("unknown flag '{flag}'\n{USAGE}"),
            other => parsed.positional.push(other.to_string()),
        }
    }
    if parsed.positional.len() > 2 {
        bail!("too many arguments\n{USAGE}");
    }
    Ok(parsed)
}

fn prompt(question: &str) -> Result<String> {
    print!("{question}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("failed to read stdin")?;
    Ok(line.trim().to_string())
}

// ---------------------------------------------------------------------------
// HUD
// ---------------------------------------------------------------------------

fn format_axes(stat: &LabelStatistic) -> String {
    let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));
    Axis::ALL
        .iter()
        .map(|&axis| {
            let s = &stat.cloud[axis.offset()];
            format!("{} {}/{}", axis.name(), fmt(s.std()), fmt(s.range()))
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn hud_text(
    info: &RedrawInfo,
    position: (usize, usize),
    summary: &Summary,
    remap: &str,
) -> String {
    let mut lines = vec![format!(
        "Label {}  ({}/{})  tables: {}  frames: {}  points: {}",
        info.label, position.0, position.1, info.tables, info.frames, info.points
    )];
    if let Some((start, end)) = info.span {
        lines.push(format!("Captured {} - {}", format_stamp(start), format_stamp(end)));
    }
    if let Some(stat) = summary.get(info.label) {
        let fmt =
            |v: Option<f64>| v.map_or_else(|| "undefined".to_string(), |v| format!("{v:.2}"));
        lines.push(format!(
            "mean std: {}  mean range: {}",
            fmt(stat.mean_std),
            fmt(stat.mean_range)
        ));
        lines.push(format!("std/range {}", format_axes(stat)));
    }
    lines.push(format!("[Space/N/Right] next label  [+/-] zoom  remap: {remap}"));
    lines.join("\n")
}

fn draw_legend(window: &mut Window, font: &Rc<Font>) {
    let x = window.width() as f32 - 220.0;
    for (i, joint) in JOINTS.iter().enumerate() {
        let [r, g, b] = joint.color_f32();
        window.draw_text(
            joint.name,
            &Point2::new(x, 20.0 + i as f32 * 18.0),
            18.0,
            font,
            &Point3::new(r, g, b),
        );
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn run() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;

    if args.catalog {
        print!("{}", catalog::format_tree());
        print!("{}", catalog::format_bones());
        return Ok(());
    }

    let mut cfg = ViewerConfig::load_or_default(&args.config)?;
    if let Some(layout) = args.layout {
        cfg.layout = layout;
    }
    if let Some(remap) = args.remap {
        cfg.remap = remap;
    }
    if args.no_ranges {
        cfg.ranges = false;
    }
    let remap = cfg.remap()?;

    let mut positional = args.positional.into_iter();
    let base = match positional.next() {
        Some(base) => base,
        None => prompt("Base folder")?,
    };
    let sub = match positional.next() {
        Some(sub) => sub,
        None => prompt("Sub folder (empty for all)")?,
    };
    if base.is_empty() {
        bail!("no base folder given\n{USAGE}");
    }
    let selection = Selection::new(base, Some(sub));

    let report = load_selection(&cfg.data_dir, &selection, &cfg.load_options())?;
    if !report.warnings.is_empty() {
        warn!(skipped = report.warnings.len(), "some tables were skipped");
        println!("Skipped {} table(s):", report.warnings.len());
        for warning in &report.warnings {
            println!("  {}", warning.path().display());
        }
    }
    let dataset = report.dataset;

    let summary = compute_label_statistics(&dataset, &JOINTS, cfg.stats_options());
    print!("{}", summary.report());

    let drawn = match args.joint {
        Some(i) => &JOINTS[i..=i],
        None => &JOINTS[..],
    };
    let mut controller = match Controller::new(&dataset, drawn, remap, cfg.scale) {
        Ok(controller) => controller,
        Err(e) => {
            info!("{e}, nothing to show");
            println!("No labels found under {}", selection.root(&cfg.data_dir).display());
            return Ok(());
        }
    };

    let mut bars = BarOverlay::default();
    render_summary(&summary, &mut bars);

    // --- kiss3d setup ---
    let mut window = Window::new("Pose Dispersion");
    window.set_light(Light::StickToCamera);
    let [r, g, b] = cfg.background;
    window.set_background_color(r, g, b);
    window.set_point_size(cfg.point_size);

    let mut cloud = PointCloud::default();
    let mut shown = controller.redraw(&mut cloud);
    info!(label = shown.label, points = shown.points, "showing label");

    let at = cloud.centroid().unwrap_or_else(Point3::origin);
    let mut camera = ArcBall::new(at + Vector3::new(0.0, 0.5, 2.5), at);
    let font = Font::default();

    while window.render_with_camera(&mut camera) {
        let mut advance = false;
        for event in window.events().iter() {
            match event.value {
                WindowEvent::Key(Key::Space, Action::Press, _)
                | WindowEvent::Key(Key::Right, Action::Press, _)
                | WindowEvent::Key(Key::N, Action::Press, _) => advance = true,
                WindowEvent::Key(Key::Equals, Action::Press, _)
                | WindowEvent::Key(Key::Add, Action::Press, _) => {
                    camera.set_dist(camera.dist() * 0.8);
                }
                WindowEvent::Key(Key::Minus, Action::Press, _)
                | WindowEvent::Key(Key::Subtract, Action::Press, _) => {
                    camera.set_dist(camera.dist() * 1.25);
                }
                _ => {}
            }
        }

        if advance {
            shown = controller.advance(&mut cloud);
            info!(label = shown.label, points = shown.points, "showing label");
            if let Some(at) = cloud.centroid() {
                camera.set_at(at);
            }
        }

        let at = camera.at();
        if let Some(floor) = cloud.floor() {
            draw_ground_grid(&mut window, &at, floor, 1.0);
        }
        cloud.draw(&mut window);
        bars.draw(&mut window, &font, shown.label);
        draw_legend(&mut window, &font);

        let hud = hud_text(&shown, controller.cycle().position(), &summary, &cfg.remap);
        window.draw_text(&hud, &Point2::new(10.0, 20.0), 30.0, &font, &Point3::new(1.0, 1.0, 1.0));
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
