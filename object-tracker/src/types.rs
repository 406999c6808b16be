//! Type definitions shared by the tracking loop, the trackers and the renderer

use crate::error::{Result, TrackerError};
use crate::tracker_trait::TrackerVariant;
use crate::video::VideoSource;
use opencv::core::{Rect, Rect2d, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Bounding box the walkthrough starts tracking from (race car in `race_car.mp4`)
pub const INITIAL_BBOX: BoundingBox = BoundingBox {
    x: 1300.0,
    y: 405.0,
    width: 160.0,
    height: 120.0,
};

/// Default GOTURN network description, looked up in the model directory
pub const GOTURN_PROTOTXT: &str = "goturn.prototxt";
/// Default GOTURN weights, looked up in the model directory
pub const GOTURN_CAFFEMODEL: &str = "goturn.caffemodel";

/// Bounding box in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X coordinate of top-left corner
    pub x: f64,
    /// Y coordinate of top-left corner
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Create new bounding box
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left and bottom-right corners, truncated to whole pixels
    pub fn corners(&self) -> ((i32, i32), (i32, i32)) {
        (
            (self.x as i32, self.y as i32),
            ((self.x + self.width) as i32, (self.y + self.height) as i32),
        )
    }

    /// Integer rectangle for the current tracker API
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.x as i32,
            self.y as i32,
            self.width as i32,
            self.height as i32,
        )
    }

    /// Floating point rectangle for the legacy tracker API
    pub fn to_rect2d(&self) -> Rect2d {
        Rect2d::new(self.x, self.y, self.width, self.height)
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Rect> for BoundingBox {
    fn from(rect: Rect) -> Self {
        Self::new(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        )
    }
}

impl From<Rect2d> for BoundingBox {
    fn from(rect: Rect2d) -> Self {
        Self::new(rect.x, rect.y, rect.width, rect.height)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Parses `x,y,w,h`
impl FromStr for BoundingBox {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TrackerError::config(format!("Invalid bounding box '{}': {}", s, e)))?;

        match values.as_slice() {
            [x, y, w, h] => Ok(Self::new(*x, *y, *w, *h)),
            _ => Err(TrackerError::config(format!(
                "Bounding box needs 4 values (x,y,w,h), got {}",
                values.len()
            ))),
        }
    }
}

/// Color in OpenCV's BGR channel order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Color {
    pub const fn bgr(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }

    pub fn to_scalar(self) -> Scalar {
        Scalar::new(self.b as f64, self.g as f64, self.r as f64, 0.0)
    }

    /// Same color for RGB image buffers
    pub fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb([self.r, self.g, self.b])
    }
}

/// Properties queried once when a video source is opened
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VideoProperties {
    pub width: i32,
    pub height: i32,
    pub fps: f64,
    /// Zero when the backend cannot tell (cameras, some streams)
    pub frame_count: i64,
}

/// How the initial bounding box is previewed before tracking starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    Disabled,
    /// Show the first frame with the box in its own window
    Window,
    /// Save the first frame with the box as an image file
    File(PathBuf),
}

impl FromStr for PreviewMode {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" => Err(TrackerError::config("Empty preview mode")),
            "off" | "none" | "disabled" => Ok(Self::Disabled),
            "window" => Ok(Self::Window),
            _ => Ok(Self::File(PathBuf::from(s))),
        }
    }
}

/// Configuration for a tracking run
///
/// `Default` reproduces the walkthrough: GOTURN on `race_car.mp4`, starting
/// from [`INITIAL_BBOX`], 50ms between frames, `q` to quit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackingConfig {
    pub source: VideoSource,

    pub tracker: TrackerVariant,

    pub initial_bbox: BoundingBox,

    /// Fixed delay after each rendered frame
    pub frame_delay_ms: u64,

    pub window_name: String,

    /// Key that stops playback
    pub quit_key: char,

    /// Directory holding `goturn.prototxt` and `goturn.caffemodel`
    pub model_dir: PathBuf,

    pub preview: PreviewMode,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            source: VideoSource::File(PathBuf::from("race_car.mp4")),
            tracker: TrackerVariant::Goturn,
            initial_bbox: INITIAL_BBOX,
            frame_delay_ms: 50,
            window_name: "Object Tracker".to_string(),
            quit_key: 'q',
            model_dir: PathBuf::from("."),
            preview: PreviewMode::Window,
        }
    }
}

impl TrackingConfig {
    /// Load a configuration from JSON; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.initial_bbox.is_valid() {
            return Err(TrackerError::config(format!(
                "Initial bounding box must have a positive size, got {}",
                self.initial_bbox
            )));
        }
        if !self.quit_key.is_ascii() {
            return Err(TrackerError::config(format!(
                "Quit key must be an ASCII character, got '{}'",
                self.quit_key
            )));
        }
        if self.window_name.is_empty() {
            return Err(TrackerError::config("Window name must not be empty"));
        }
        Ok(())
    }

    pub fn goturn_prototxt(&self) -> PathBuf {
        self.model_dir.join(GOTURN_PROTOTXT)
    }

    pub fn goturn_caffemodel(&self) -> PathBuf {
        self.model_dir.join(GOTURN_CAFFEMODEL)
    }
}
