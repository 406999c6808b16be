//! Single-object video tracking
//!
//! Opens a video, lets one of OpenCV's eight single-object trackers
//! (BOOSTING, MIL, KCF, CSRT, TLD, MEDIANFLOW, GOTURN, MOSSE) follow a
//! bounding box from the first frame onwards, and plays the result back in a
//! window with the box or a failure notice drawn on every frame.

pub mod error;
pub mod image_utils;
pub mod opencv_trackers;
pub mod renderer;
pub mod session;
pub mod tracker_factory;
pub mod tracker_trait;
pub mod types;
pub mod video;

pub use error::{Result, TrackerError};
pub use renderer::{HighGuiRenderer, Renderer};
pub use session::{run_tracking_loop, LoopOptions, TrackingSession, TrackingStats};
pub use tracker_factory::TrackerFactory;
pub use tracker_trait::{ObjectTracker, TrackerVariant};
pub use types::{BoundingBox, PreviewMode, TrackingConfig, VideoProperties, INITIAL_BBOX};
pub use video::{FrameSource, VideoCaptureSource, VideoSource};

/// Open the configured video, track and display until it ends or the user quits
pub fn run(config: &TrackingConfig) -> Result<TrackingStats> {
    TrackingSession::open_opencv(config)?.run()
}

/// Get library version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get supported tracker variants
pub fn get_tracker_variants() -> Vec<TrackerVariant> {
    TrackerVariant::ALL.to_vec()
}
