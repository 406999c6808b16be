/// Single-object tracking on a video file
///
/// Tracks the box (1300, 405, 160, 120) through `race_car.mp4` with GOTURN by
/// default. GOTURN needs `goturn.prototxt` and `goturn.caffemodel` in the model
/// directory (https://github.com/Mogball/goturn-files).
///
/// Usage:
///   cargo run --release --example track_video [-- OPTIONS] [VIDEO]
///
/// Examples:
///   cargo run --release --example track_video
///   cargo run --release --example track_video -- --tracker CSRT race_car.mp4
///   cargo run --release --example track_video -- --tracker KCF --bbox 100,80,64,48 0
///   cargo run --release --example track_video -- --preview initial_bbox.png
///
/// Press 'q' in the window to stop.
use anyhow::Context;
use clap::Parser;
use object_tracker::{BoundingBox, PreviewMode, TrackerVariant, TrackingConfig, VideoSource};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "track_video", about = "Track one bounding box through a video")]
struct Args {
    /// Video file path, or a camera index
    video: Option<String>,

    /// JSON configuration file; flags override its values
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// BOOSTING, MIL, KCF, CSRT, TLD, MEDIANFLOW, GOTURN or MOSSE
    #[arg(long)]
    tracker: Option<String>,

    /// Initial box as x,y,w,h
    #[arg(long)]
    bbox: Option<String>,

    /// Delay after each frame in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// off, window, or an image path to save the preview to
    #[arg(long)]
    preview: Option<String>,

    /// Directory with the GOTURN model files
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// List the available trackers and exit
    #[arg(long)]
    list: bool,
}

fn build_config(args: &Args) -> anyhow::Result<TrackingConfig> {
    let mut config = match &args.config {
        Some(path) => TrackingConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TrackingConfig::default(),
    };

    if let Some(video) = &args.video {
        config.source = video.parse::<VideoSource>()?;
    }
    if let Some(tracker) = &args.tracker {
        config.tracker = tracker.parse::<TrackerVariant>()?;
    }
    if let Some(bbox) = &args.bbox {
        config.initial_bbox = bbox.parse::<BoundingBox>()?;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.frame_delay_ms = delay_ms;
    }
    if let Some(preview) = &args.preview {
        config.preview = preview.parse::<PreviewMode>()?;
    }
    if let Some(model_dir) = &args.model_dir {
        config.model_dir = model_dir.clone();
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.list {
        for (i, variant) in object_tracker::get_tracker_variants().iter().enumerate() {
            println!("{}: {}", i, variant);
        }
        return Ok(());
    }

    let config = build_config(&args)?;

    log::info!(
        "object-tracker {} | {} on {} | box {}",
        object_tracker::version(),
        config.tracker,
        config.source,
        config.initial_bbox
    );

    let stats = object_tracker::run(&config)
        .with_context(|| format!("Tracking {} failed", config.source))?;

    eprintln!("\n📊 Final Statistics:");
    eprintln!("  • Frames tracked: {}", stats.frames);
    eprintln!("  • Successful updates: {}", stats.tracked);
    eprintln!("  • Tracking failures: {}", stats.failed);
    eprintln!("  • Duration: {:.1}s", stats.elapsed.as_secs_f32());
    eprintln!("  • Average FPS: {:.1}", stats.average_fps);
    if stats.stopped_by_user {
        eprintln!("  • Stopped by user");
    }

    Ok(())
}
