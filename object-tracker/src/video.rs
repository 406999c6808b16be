//! Video frame sources
//! This module provides sequential frame acquisition using OpenCV's VideoCapture

use crate::error::{Result, TrackerError};
use crate::types::VideoProperties;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, CAP_ANY},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Sequential producer of frames with an end-of-stream signal
pub trait FrameSource {
    type Frame;

    /// Properties queried when the source was opened
    fn properties(&self) -> VideoProperties;

    /// Next frame, or `None` once the stream is exhausted
    fn read_frame(&mut self) -> Result<Option<Self::Frame>>;
}

/// Video source enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSource {
    Camera(i32),
    File(PathBuf),
}

/// A bare integer selects a camera index, anything else is a file path
impl FromStr for VideoSource {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(TrackerError::config("Empty video source"));
        }
        Ok(match s.parse::<i32>() {
            Ok(index) => Self::Camera(index),
            Err(_) => Self::File(PathBuf::from(s)),
        })
    }
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera(index) => write!(f, "camera {}", index),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// OpenCV capture that owns the video handle until dropped
pub struct VideoCaptureSource {
    cap: VideoCapture,
    source: VideoSource,
    properties: VideoProperties,
    frames_read: u64,
    released: bool,
}

impl VideoCaptureSource {
    /// Open a file or camera. Fails without leaving anything open if the
    /// backend cannot read the source.
    pub fn open(source: &VideoSource) -> Result<Self> {
        let cap = match source {
            VideoSource::Camera(index) => VideoCapture::new(*index, CAP_ANY).map_err(|e| {
                TrackerError::video(format!("Failed to open camera {}: {}", index, e))
            })?,
            VideoSource::File(path) => {
                let path_str = path
                    .to_str()
                    .ok_or_else(|| TrackerError::video("Invalid path"))?;
                VideoCapture::from_file(path_str, CAP_ANY)
                    .map_err(|e| TrackerError::video(format!("{}: {}", path_str, e)))?
            }
        };

        if !cap.is_opened().unwrap_or(false) {
            return Err(TrackerError::video(source.to_string()));
        }

        let mut fps = cap.get(videoio::CAP_PROP_FPS).unwrap_or(0.0);
        if fps <= 0.0 {
            log::warn!("Video source returned invalid FPS ({}), defaulting to 20.0", fps);
            fps = 20.0;
        }

        let properties = VideoProperties {
            width: cap.get(videoio::CAP_PROP_FRAME_WIDTH).unwrap_or(0.0) as i32,
            height: cap.get(videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0) as i32,
            fps,
            frame_count: cap.get(videoio::CAP_PROP_FRAME_COUNT).unwrap_or(0.0) as i64,
        };

        log::info!(
            "Video opened: {} ({}x{} @ {:.2} FPS, {} frames)",
            source,
            properties.width,
            properties.height,
            properties.fps,
            properties.frame_count
        );

        Ok(Self {
            cap,
            source: source.clone(),
            properties,
            frames_read: 0,
            released: false,
        })
    }

    /// Release the capture handle. Calling this more than once is a no-op.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.cap.release()?;
        log::debug!("Released {} after {} frames", self.source, self.frames_read);
        Ok(())
    }
}

impl FrameSource for VideoCaptureSource {
    type Frame = Mat;

    fn properties(&self) -> VideoProperties {
        self.properties
    }

    fn read_frame(&mut self) -> Result<Option<Mat>> {
        if self.released {
            return Ok(None);
        }

        let mut frame = Mat::default();
        let read_success = self
            .cap
            .read(&mut frame)
            .map_err(|e| TrackerError::frame_read(e.to_string()))?;

        if !read_success || frame.empty() {
            log::info!("End of video stream after {} frames", self.frames_read);
            return Ok(None);
        }

        self.frames_read += 1;
        Ok(Some(frame))
    }
}

impl Drop for VideoCaptureSource {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Failed to release {}: {}", self.source, e);
        }
    }
}
