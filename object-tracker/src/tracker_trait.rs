/// Unified tracker interface over OpenCV's single-object trackers
///
/// Every algorithm is driven through the same two calls, whatever it does
/// internally (correlation filters, boosting, or a Caffe network for GOTURN).
use crate::error::{Result, TrackerError};
use crate::types::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Common interface for single-object trackers operating on frames of type `F`
pub trait ObjectTracker<F> {
    /// Bind the tracker to the target inside `bbox` on the first frame.
    /// Returns `false` when the algorithm rejects the initial target.
    fn init(&mut self, frame: &F, bbox: BoundingBox) -> Result<bool>;

    /// Locate the target on the next frame. `None` means tracking failed on
    /// this frame; the tracker stays usable for the following ones.
    fn update(&mut self, frame: &F) -> Result<Option<BoundingBox>>;
}

impl<F, T: ObjectTracker<F> + ?Sized> ObjectTracker<F> for Box<T> {
    fn init(&mut self, frame: &F, bbox: BoundingBox) -> Result<bool> {
        (**self).init(frame, bbox)
    }

    fn update(&mut self, frame: &F) -> Result<Option<BoundingBox>> {
        (**self).update(frame)
    }
}

/// Tracker algorithm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrackerVariant {
    Boosting,
    Mil,
    Kcf,
    Csrt,
    Tld,
    MedianFlow,
    Goturn,
    Mosse,
}

impl TrackerVariant {
    /// All variants, in the order the walkthrough lists them
    pub const ALL: [TrackerVariant; 8] = [
        Self::Boosting,
        Self::Mil,
        Self::Kcf,
        Self::Csrt,
        Self::Tld,
        Self::MedianFlow,
        Self::Goturn,
        Self::Mosse,
    ];

    /// Position in [`TrackerVariant::ALL`], used to index constructor tables
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Boosting => "BOOSTING",
            Self::Mil => "MIL",
            Self::Kcf => "KCF",
            Self::Csrt => "CSRT",
            Self::Tld => "TLD",
            Self::MedianFlow => "MEDIANFLOW",
            Self::Goturn => "GOTURN",
            Self::Mosse => "MOSSE",
        }
    }

    /// Overlay label drawn on every frame
    pub fn label(self) -> String {
        format!("{} Tracker", self.name())
    }
}

impl fmt::Display for TrackerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrackerVariant {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|variant| variant.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TrackerError::UnknownTracker(s.to_string()))
    }
}
