//! Image helpers: destination sizes, file I/O, and box overlays drawn with
//! `imageproc`.
//!
//! Available when the `image-io` feature is enabled. The post-processing core
//! does not depend on this module.

use crate::assemble::Detection;
use crate::coords::ImageSize;
use crate::util::{DetPostError, DetPostResult};
use ab_glyph::PxScale;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;

pub use ab_glyph::FontArc;

fn io_error(err: image::ImageError) -> DetPostError {
    DetPostError::ImageIo {
        reason: err.to_string(),
    }
}

/// Reads the pixel size of an image file without decoding all pixels.
pub fn image_size<P: AsRef<Path>>(path: P) -> DetPostResult<ImageSize> {
    let (width, height) = image::image_dimensions(path).map_err(io_error)?;
    ImageSize::new(width, height)
}

/// Returns the size of an in-memory image.
pub fn image_size_of(img: &RgbImage) -> DetPostResult<ImageSize> {
    ImageSize::new(img.width(), img.height())
}

/// Loads an image from disk and converts it to RGB.
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> DetPostResult<RgbImage> {
    let img = image::open(path).map_err(io_error)?;
    Ok(img.to_rgb8())
}

/// Saves an image; the format follows the file extension.
pub fn save_image<P: AsRef<Path>>(img: &RgbImage, path: P) -> DetPostResult<()> {
    img.save(path).map_err(io_error)
}

/// Loads a TrueType/OpenType font for overlay captions.
pub fn load_font<P: AsRef<Path>>(path: P) -> DetPostResult<FontArc> {
    let bytes = std::fs::read(path).map_err(|err| DetPostError::ImageIo {
        reason: err.to_string(),
    })?;
    FontArc::try_from_vec(bytes).map_err(|err| DetPostError::ImageIo {
        reason: err.to_string(),
    })
}

/// Caption size in pixels for an image of the given width.
pub fn caption_scale(width: u32) -> f32 {
    (f64::from(width).sqrt() / 1.5).round().max(1.0) as f32
}

/// Top-left corner of a caption placed just above a box.
///
/// The text baseline sits 4 px above the box top and 4 px in from its left
/// edge.
pub fn caption_origin(bbox: [i32; 4], scale: f32) -> (i32, i32) {
    let x = bbox[0].min(bbox[2]);
    let y = bbox[1].min(bbox[3]);
    (x.saturating_add(4), y.saturating_sub(4 + scale.round() as i32))
}

/// Draws each detection's pixel box as a rectangle outline, and its
/// [`Detection::caption`] above the box when a font is supplied.
///
/// Captions get a black shadow offset by one pixel. Box edges outside the
/// image are not drawn; boxes entirely outside are skipped.
pub fn draw_detections(
    img: &mut RgbImage,
    detections: &[Detection],
    color: [u8; 3],
    thickness: u32,
    font: Option<&FontArc>,
) {
    let color = Rgb(color);
    let scale = PxScale::from(caption_scale(img.width()));
    for det in detections {
        let Some(rect) = box_rect(img, det.bbox) else {
            continue;
        };
        for inset in 0..thickness.max(1) {
            let Some(inner) = inset_rect(rect, inset) else {
                break;
            };
            draw_hollow_rect_mut(img, inner, color);
        }
        if let Some(font) = font {
            let caption = det.caption();
            let (x, y) = caption_origin(det.bbox, scale.y);
            draw_text_mut(img, Rgb([0, 0, 0]), x + 1, y + 1, scale, font, &caption);
            draw_text_mut(img, color, x, y, scale, font, &caption);
        }
    }
}

fn box_rect(img: &RgbImage, bbox: [i32; 4]) -> Option<Rect> {
    let (w, h) = (i64::from(img.width()), i64::from(img.height()));
    let x0 = i64::from(bbox[0].min(bbox[2]));
    let x1 = i64::from(bbox[0].max(bbox[2]));
    let y0 = i64::from(bbox[1].min(bbox[3]));
    let y1 = i64::from(bbox[1].max(bbox[3]));
    if x1 < 0 || y1 < 0 || x0 >= w || y0 >= h {
        return None;
    }
    let width = u32::try_from(x1 - x0 + 1).ok()?;
    let height = u32::try_from(y1 - y0 + 1).ok()?;
    Some(Rect::at(x0 as i32, y0 as i32).of_size(width, height))
}

fn inset_rect(rect: Rect, inset: u32) -> Option<Rect> {
    let shrink = inset.checked_mul(2)?;
    if rect.width() <= shrink || rect.height() <= shrink {
        return None;
    }
    let offset = i32::try_from(inset).ok()?;
    Some(
        Rect::at(rect.left() + offset, rect.top() + offset)
            .of_size(rect.width() - shrink, rect.height() - shrink),
    )
}
