//! Error types for the object tracking walkthrough

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the tracking library
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors that can occur while opening, tracking or displaying a video
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Error opening video file: {0}")]
    VideoOpen(String),

    #[error("Frame read failed: {0}")]
    FrameRead(String),

    #[error("Tracker creation failed: {0}")]
    TrackerCreate(String),

    #[error("GOTURN model file not found: {}", .0.display())]
    ModelMissing(PathBuf),

    #[error("Unknown tracker type: {0}")]
    UnknownTracker(String),

    #[error("Display error: {0}")]
    Display(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl TrackerError {
    pub fn video<S: Into<String>>(msg: S) -> Self {
        Self::VideoOpen(msg.into())
    }

    pub fn frame_read<S: Into<String>>(msg: S) -> Self {
        Self::FrameRead(msg.into())
    }

    pub fn tracker_create<S: Into<String>>(msg: S) -> Self {
        Self::TrackerCreate(msg.into())
    }

    pub fn display<S: Into<String>>(msg: S) -> Self {
        Self::Display(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }
}
