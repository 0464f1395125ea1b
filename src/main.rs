use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use serde::Serialize;

use snapcam::platform::headless::{HeadlessStream, PageBuilder};
use snapcam::{App, CameraOutcome, FeatureStatus, PageConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CameraMode {
    /// Grant access with a synthetic stream
    Grant,
    /// Reject the permission prompt
    Deny,
    /// Never answer the permission prompt
    Pending,
}

/// Drive the capture page headlessly and write its downloads to disk
#[derive(Debug, Parser)]
#[command(name = "snapcam", version)]
struct Args {
    /// JSON page configuration (defaults apply to absent fields)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the downloaded captures are written to
    #[arg(long, default_value = ".")]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = CameraMode::Grant)]
    camera: CameraMode,

    /// Synthetic frame colour as RRGGBB; a gradient when omitted
    #[arg(long)]
    color: Option<String>,

    /// Synthetic stream size
    #[arg(long, default_value_t = 1280)]
    stream_width: u32,
    #[arg(long, default_value_t = 720)]
    stream_height: u32,

    /// Pin the file name date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Remove an element from the page before wiring (repeatable)
    #[arg(long = "missing")]
    missing: Vec<String>,

    /// Trigger ids to click, in order
    #[arg(default_values_t = ["capture".to_string(), "save".to_string()])]
    clicks: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SavedFile {
    path: PathBuf,
    bytes: usize,
    sha256: String,
}

#[derive(Serialize)]
struct Report {
    status: FeatureStatus,
    camera: Option<String>,
    clicks: Vec<(String, usize)>,
    alerts: Vec<String>,
    saved: Vec<SavedFile>,
}

fn parse_color(hex_rgb: &str) -> Result<[u8; 4]> {
    let bytes = hex::decode(hex_rgb.trim_start_matches('#')).context("colour must be hex RRGGBB")?;
    match bytes.as_slice() {
        [r, g, b] => Ok([*r, *g, *b, 255]),
        _ => bail!("colour must be exactly three bytes, got {}", bytes.len()),
    }
}

fn describe(outcome: &CameraOutcome) -> String {
    match outcome {
        CameraOutcome::Attached => "attached".to_string(),
        CameraOutcome::NoVideoElement => "granted, no video element".to_string(),
        CameraOutcome::Failed(e) => format!("failed: {}", e),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            PageConfig::from_json(&raw)?
        }
        None => PageConfig::default(),
    };

    let mut builder = PageBuilder::standard();
    for id in &args.missing {
        builder = builder.without(id);
    }
    let page = Rc::new(builder.build());
    if let Some(date) = args.date {
        page.set_today(date);
    }
    match args.camera {
        CameraMode::Grant => {
            let mut stream = HeadlessStream::new(args.stream_width, args.stream_height);
            if let Some(color) = &args.color {
                stream = stream.solid(parse_color(color)?);
            }
            page.grant_camera(stream);
        }
        CameraMode::Deny => page.deny_camera("NotAllowedError: Permission denied"),
        CameraMode::Pending => page.ignore_camera_prompt(),
    }

    let app = App::init(page.clone(), config)?;

    // The camera answer arrives before any click, as it would on a real page
    // once the user has dealt with the prompt.
    let camera = Rc::new(std::cell::RefCell::new(None));
    let mut pool = LocalPool::new();
    {
        let camera = camera.clone();
        let task = app.camera_task();
        pool.spawner()
            .spawn_local(async move {
                let outcome = task.await;
                *camera.borrow_mut() = Some(describe(&outcome));
            })
            .context("spawning camera request")?;
    }
    pool.run_until_stalled();

    let clicks: Vec<(String, usize)> = args
        .clicks
        .iter()
        .map(|id| (id.clone(), page.click(id)))
        .collect();

    fs::create_dir_all(&args.out).with_context(|| format!("creating {}", args.out.display()))?;
    let mut saved = Vec::new();
    for download in page.downloads() {
        let path = args.out.join(&download.filename);
        fs::write(&path, &download.image.bytes).with_context(|| format!("writing {}", path.display()))?;
        saved.push(SavedFile {
            sha256: download.sha256_hex(),
            bytes: download.image.bytes.len(),
            path,
        });
    }

    let report = Report {
        status: app.status().clone(),
        camera: camera.borrow().clone(),
        clicks,
        alerts: page.alerts(),
        saved,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("capture: {:?}", report.status.capture);
        for (name, state) in &report.status.decorations {
            println!("decoration {}: {:?}", name, state);
        }
        println!("camera: {}", report.camera.as_deref().unwrap_or("prompt unanswered"));
        for (id, handlers) in &report.clicks {
            println!("click {} -> {} handler(s)", id, handlers);
        }
        for alert in &report.alerts {
            println!("alert: {}", alert);
        }
        for file in &report.saved {
            println!("saved {} ({} bytes, sha256 {})", file.path.display(), file.bytes, file.sha256);
        }
    }
    Ok(())
}
