//! Frame rendering and display
//!
//! The tracking loop only talks to [`Renderer`]; [`HighGuiRenderer`] is the
//! OpenCV window implementation.

use crate::error::{Result, TrackerError};
use crate::image_utils;
use crate::types::{BoundingBox, Color, PreviewMode, VideoProperties};
use opencv::{core::Mat, highgui, prelude::*};

/// Window used for the one-shot preview of the initial box
pub const PREVIEW_WINDOW: &str = "Initial Bounding Box";

/// Drawing and display surface for frames of type `F`
pub trait Renderer<F> {
    /// Show the first frame with the initial box, before tracking starts
    fn preview(&mut self, frame: &F, bbox: &BoundingBox) -> Result<()>;

    fn draw_box(&mut self, frame: &mut F, bbox: &BoundingBox) -> Result<()>;

    fn draw_text(
        &mut self,
        frame: &mut F,
        text: &str,
        origin: (i32, i32),
        color: Color,
    ) -> Result<()>;

    fn show(&mut self, frame: &F) -> Result<()>;

    /// Wait up to `delay_ms` for a key press. Returns the key code, or -1
    /// when nothing was pressed.
    fn wait_key(&mut self, delay_ms: i32) -> Result<i32>;
}

/// Renderer backed by OpenCV highgui windows
///
/// Every window this renderer opens is destroyed exactly once, either by
/// [`HighGuiRenderer::close`] or on drop.
pub struct HighGuiRenderer {
    window_name: String,
    preview_mode: PreviewMode,
    open_windows: Vec<String>,
}

impl HighGuiRenderer {
    /// Create the main window at half the source resolution
    pub fn new(
        window_name: &str,
        properties: &VideoProperties,
        preview_mode: PreviewMode,
    ) -> Result<Self> {
        highgui::named_window(window_name, highgui::WINDOW_NORMAL)
            .map_err(|e| TrackerError::display(format!("Failed to create window: {}", e)))?;

        // Built before resizing so the window is destroyed if resizing fails
        let renderer = Self {
            window_name: window_name.to_string(),
            preview_mode,
            open_windows: vec![window_name.to_string()],
        };

        if properties.width > 0 && properties.height > 0 {
            highgui::resize_window(window_name, properties.width / 2, properties.height / 2)?;
        }

        log::debug!("Window '{}' created", window_name);
        Ok(renderer)
    }

    /// Destroy all windows opened by this renderer. Safe to call repeatedly.
    pub fn close(&mut self) -> Result<()> {
        let windows = std::mem::take(&mut self.open_windows);
        destroy_windows(windows, |name| Ok(highgui::destroy_window(name)?))
    }
}

/// Destroy every window in `windows`, even when an earlier one fails.
/// Returns the first error.
fn destroy_windows<D>(windows: Vec<String>, mut destroy: D) -> Result<()>
where
    D: FnMut(&str) -> Result<()>,
{
    let mut first_error = None;
    for name in windows {
        match destroy(&name) {
            Ok(()) => log::debug!("Window '{}' destroyed", name),
            Err(e) => {
                log::warn!("Failed to destroy window '{}': {}", name, e);
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

impl Renderer<Mat> for HighGuiRenderer {
    fn preview(&mut self, frame: &Mat, bbox: &BoundingBox) -> Result<()> {
        match &self.preview_mode {
            PreviewMode::Disabled => Ok(()),
            PreviewMode::Window => {
                let mut still = frame.try_clone()?;
                image_utils::draw_rectangle(&mut still, bbox)?;
                highgui::named_window(PREVIEW_WINDOW, highgui::WINDOW_NORMAL)?;
                if !self.open_windows.iter().any(|w| w == PREVIEW_WINDOW) {
                    self.open_windows.push(PREVIEW_WINDOW.to_string());
                }
                highgui::imshow(PREVIEW_WINDOW, &still)?;
                Ok(())
            }
            PreviewMode::File(path) => {
                let still = image_utils::render_preview(frame, bbox)?;
                still.save(path)?;
                log::info!("Initial bounding box preview saved to {}", path.display());
                Ok(())
            }
        }
    }

    fn draw_box(&mut self, frame: &mut Mat, bbox: &BoundingBox) -> Result<()> {
        image_utils::draw_rectangle(frame, bbox)
    }

    fn draw_text(
        &mut self,
        frame: &mut Mat,
        text: &str,
        origin: (i32, i32),
        color: Color,
    ) -> Result<()> {
        image_utils::draw_text(frame, text, origin, color)
    }

    fn show(&mut self, frame: &Mat) -> Result<()> {
        highgui::imshow(&self.window_name, frame)?;
        Ok(())
    }

    fn wait_key(&mut self, delay_ms: i32) -> Result<i32> {
        Ok(highgui::wait_key(delay_ms)?)
    }
}

impl Drop for HighGuiRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close windows: {}", e);
        }
    }
}
