//! Tracker construction by variant
//!
//! Each [`TrackerVariant`] maps to exactly one constructor, looked up by the
//! variant's index. Adding an algorithm means adding a table entry.

use crate::error::Result;
use crate::opencv_trackers;
use crate::tracker_trait::{ObjectTracker, TrackerVariant};
use crate::types::TrackingConfig;
use opencv::core::Mat;

/// Builds a tracker for frames of type `F`
pub type TrackerConstructor<F> =
    Box<dyn Fn(&TrackingConfig) -> Result<Box<dyn ObjectTracker<F>>>>;

type OpenCvConstructor = fn(&TrackingConfig) -> Result<opencv_trackers::BoxedTracker>;

/// OpenCV constructors, in [`TrackerVariant::ALL`] order
const OPENCV_CONSTRUCTORS: [OpenCvConstructor; 8] = [
    opencv_trackers::create_boosting,
    opencv_trackers::create_mil,
    opencv_trackers::create_kcf,
    opencv_trackers::create_csrt,
    opencv_trackers::create_tld,
    opencv_trackers::create_median_flow,
    opencv_trackers::create_goturn,
    opencv_trackers::create_mosse,
];

/// Lookup table from tracker variant to constructor
pub struct TrackerFactory<F> {
    constructors: [TrackerConstructor<F>; 8],
}

impl<F> TrackerFactory<F> {
    /// Build a table by asking `make` for the constructor of every variant
    pub fn new(mut make: impl FnMut(TrackerVariant) -> TrackerConstructor<F>) -> Self {
        Self {
            constructors: TrackerVariant::ALL.map(&mut make),
        }
    }

    /// Construct the tracker for `variant`
    pub fn create(
        &self,
        variant: TrackerVariant,
        config: &TrackingConfig,
    ) -> Result<Box<dyn ObjectTracker<F>>> {
        log::info!("Creating {} tracker", variant);
        (self.constructors[variant.index()])(config)
    }
}

impl TrackerFactory<Mat> {
    /// Table backed by OpenCV's tracking module
    pub fn opencv() -> Self {
        Self::new(|variant| {
            let constructor = OPENCV_CONSTRUCTORS[variant.index()];
            Box::new(move |config: &TrackingConfig| constructor(config))
        })
    }
}

impl Default for TrackerFactory<Mat> {
    fn default() -> Self {
        Self::opencv()
    }
}
