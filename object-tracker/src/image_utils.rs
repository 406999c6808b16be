/// Image utilities for drawing tracking overlays and the initial-box preview
use crate::error::{Result, TrackerError};
use crate::types::{BoundingBox, Color};
use image::{Rgb, RgbImage};
use opencv::{
    core::{Mat, Point},
    imgproc,
    prelude::*,
};

/// Tracked box outline (blue)
pub const BOX_COLOR: Color = Color::bgr(255, 0, 0);
pub const BOX_THICKNESS: i32 = 2;

/// Default text color (green)
pub const LABEL_COLOR: Color = Color::bgr(50, 170, 50);
/// Tracking failure text color (red)
pub const FAILURE_COLOR: Color = Color::bgr(0, 0, 255);

pub const FONT_SCALE: f64 = 1.0;
pub const TEXT_THICKNESS: i32 = 3;

/// Draw the outline of `bbox` onto a BGR frame
pub fn draw_rectangle(frame: &mut Mat, bbox: &BoundingBox) -> Result<()> {
    let ((x1, y1), (x2, y2)) = bbox.corners();
    imgproc::rectangle_points(
        frame,
        Point::new(x1, y1),
        Point::new(x2, y2),
        BOX_COLOR.to_scalar(),
        BOX_THICKNESS,
        imgproc::LINE_8,
        0,
    )?;
    Ok(())
}

/// Draw `text` with its baseline starting at `origin`
pub fn draw_text(frame: &mut Mat, text: &str, origin: (i32, i32), color: Color) -> Result<()> {
    imgproc::put_text(
        frame,
        text,
        Point::new(origin.0, origin.1),
        imgproc::FONT_HERSHEY_SIMPLEX,
        FONT_SCALE,
        color.to_scalar(),
        TEXT_THICKNESS,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}

/// Convert OpenCV Mat (BGR) to RgbImage
pub fn mat_to_rgb_image(mat: &Mat) -> Result<RgbImage> {
    let width = mat.cols() as u32;
    let height = mat.rows() as u32;

    let mut rgb_mat = Mat::default();
    imgproc::cvt_color_def(mat, &mut rgb_mat, imgproc::COLOR_BGR2RGB)?;

    let data = rgb_mat.data_bytes()?.to_vec();

    RgbImage::from_vec(width, height, data)
        .ok_or_else(|| TrackerError::display("Failed to create RgbImage"))
}

/// Draw a thick rectangle on an image
///
/// # Arguments
/// * `img` - The image to draw on
/// * `x` - X coordinate of top-left corner
/// * `y` - Y coordinate of top-left corner
/// * `width` - Width of the rectangle
/// * `height` - Height of the rectangle
/// * `color` - Color of the rectangle
/// * `thickness` - Thickness of the border (in pixels)
pub fn draw_rect(
    img: &mut RgbImage,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    color: Rgb<u8>,
    thickness: i32,
) {
    use imageproc::drawing::draw_hollow_rect_mut;
    use imageproc::rect::Rect;

    if width == 0 || height == 0 {
        log::warn!(
            "Cannot draw rect with zero dimensions - width: {}, height: {}",
            width,
            height
        );
        return;
    }

    // Thick border is drawn as nested one-pixel outlines growing outwards
    for offset in 0..thickness {
        let expanded = Rect::at(x - offset, y - offset).of_size(
            width + (offset * 2) as u32,
            height + (offset * 2) as u32,
        );
        draw_hollow_rect_mut(img, expanded, color);
    }
}

/// Copy of `frame` in RGB with `bbox` outlined, for the one-shot preview
pub fn render_preview(frame: &Mat, bbox: &BoundingBox) -> Result<RgbImage> {
    let mut preview = mat_to_rgb_image(frame)?;
    let ((x1, y1), (x2, y2)) = bbox.corners();
    draw_rect(
        &mut preview,
        x1,
        y1,
        (x2 - x1).max(0) as u32,
        (y2 - y1).max(0) as u32,
        BOX_COLOR.to_rgb(),
        BOX_THICKNESS,
    );
    Ok(preview)
}
