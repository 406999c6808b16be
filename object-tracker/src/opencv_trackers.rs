//! OpenCV-backed implementations of [`ObjectTracker`]
//!
//! OpenCV exposes two tracker APIs: the current `cv::Tracker` (integer
//! `Rect`, `init` returns nothing) and `cv::legacy::Tracker` (`Rect2d`,
//! `init` reports success). Both are adapted to the same trait here.

use crate::error::{Result, TrackerError};
use crate::tracker_trait::ObjectTracker;
use crate::types::{BoundingBox, TrackingConfig};
use opencv::{
    core::{Mat, Rect, Rect2d},
    prelude::*,
    tracking::{
        legacy_TrackerBoosting, legacy_TrackerBoosting_Params, legacy_TrackerCSRT,
        legacy_TrackerCSRT_Params, legacy_TrackerMIL, legacy_TrackerMIL_Params,
        legacy_TrackerMOSSE, legacy_TrackerMedianFlow, legacy_TrackerMedianFlow_Params,
        legacy_TrackerTLD, legacy_TrackerTLD_Params, legacy_TrackerTrait, TrackerKCF,
        TrackerKCF_Params,
    },
    video::{TrackerGOTURN, TrackerGOTURN_Params, TrackerTrait},
};
use std::path::Path;

/// Boxed tracker over OpenCV frames, as produced by the constructors below
pub type BoxedTracker = Box<dyn ObjectTracker<Mat>>;

/// Adapter for trackers implementing the current `cv::Tracker` API
pub struct ModernTracker<T> {
    inner: T,
}

impl<T: TrackerTrait> ModernTracker<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: TrackerTrait> ObjectTracker<Mat> for ModernTracker<T> {
    fn init(&mut self, frame: &Mat, bbox: BoundingBox) -> Result<bool> {
        self.inner.init(frame, bbox.to_rect())?;
        Ok(true)
    }

    fn update(&mut self, frame: &Mat) -> Result<Option<BoundingBox>> {
        let mut rect = Rect::default();
        let ok = self.inner.update(frame, &mut rect)?;
        Ok(ok.then(|| BoundingBox::from(rect)))
    }
}

/// Adapter for trackers that only exist in the `cv::legacy` namespace
pub struct LegacyTracker<T> {
    inner: T,
}

impl<T: legacy_TrackerTrait> LegacyTracker<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: legacy_TrackerTrait> ObjectTracker<Mat> for LegacyTracker<T> {
    fn init(&mut self, frame: &Mat, bbox: BoundingBox) -> Result<bool> {
        Ok(self.inner.init(frame, bbox.to_rect2d())?)
    }

    fn update(&mut self, frame: &Mat) -> Result<Option<BoundingBox>> {
        let mut rect = Rect2d::default();
        let ok = self.inner.update(frame, &mut rect)?;
        Ok(ok.then(|| BoundingBox::from(rect)))
    }
}

pub fn create_boosting(_config: &TrackingConfig) -> Result<BoxedTracker> {
    let params = legacy_TrackerBoosting_Params::default()?;
    let tracker = legacy_TrackerBoosting::create(&params)?;
    Ok(Box::new(LegacyTracker::new(tracker)))
}

pub fn create_mil(_config: &TrackingConfig) -> Result<BoxedTracker> {
    let params = legacy_TrackerMIL_Params::default()?;
    let tracker = legacy_TrackerMIL::create(&params)?;
    Ok(Box::new(LegacyTracker::new(tracker)))
}

pub fn create_kcf(_config: &TrackingConfig) -> Result<BoxedTracker> {
    let params = TrackerKCF_Params::default()?;
    let tracker = TrackerKCF::create(params)?;
    Ok(Box::new(ModernTracker::new(tracker)))
}

pub fn create_csrt(_config: &TrackingConfig) -> Result<BoxedTracker> {
    let params = legacy_TrackerCSRT_Params::default()?;
    let tracker = legacy_TrackerCSRT::create(&params)?;
    Ok(Box::new(LegacyTracker::new(tracker)))
}

pub fn create_tld(_config: &TrackingConfig) -> Result<BoxedTracker> {
    let params = legacy_TrackerTLD_Params::default()?;
    let tracker = legacy_TrackerTLD::create(&params)?;
    Ok(Box::new(LegacyTracker::new(tracker)))
}

pub fn create_median_flow(_config: &TrackingConfig) -> Result<BoxedTracker> {
    let params = legacy_TrackerMedianFlow_Params::default()?;
    let tracker = legacy_TrackerMedianFlow::create(&params)?;
    Ok(Box::new(LegacyTracker::new(tracker)))
}

/// GOTURN runs a Caffe network; both model files must be present before
/// OpenCV tries to load them
pub fn create_goturn(config: &TrackingConfig) -> Result<BoxedTracker> {
    let prototxt = config.goturn_prototxt();
    let caffemodel = config.goturn_caffemodel();
    ensure_model_file(&prototxt)?;
    ensure_model_file(&caffemodel)?;

    let mut params = TrackerGOTURN_Params::default()?;
    params.set_model_txt(&path_str(&prototxt)?);
    params.set_model_bin(&path_str(&caffemodel)?);

    log::info!(
        "Loading GOTURN model: {} / {}",
        prototxt.display(),
        caffemodel.display()
    );
    let tracker = TrackerGOTURN::create(&params)?;
    Ok(Box::new(ModernTracker::new(tracker)))
}

pub fn create_mosse(_config: &TrackingConfig) -> Result<BoxedTracker> {
    let tracker = legacy_TrackerMOSSE::create()?;
    Ok(Box::new(LegacyTracker::new(tracker)))
}

fn ensure_model_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(TrackerError::ModelMissing(path.to_path_buf()))
    }
}

fn path_str(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| TrackerError::config(format!("Non UTF-8 path: {}", path.display())))
}
