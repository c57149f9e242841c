//! Same-canvas rotation and resizing of image/mask pairs.
//!
//! Color images are resampled bilinearly. Class masks always use nearest
//! neighbor so that no intermediate class id can ever appear. Samples that
//! fall outside the source are zero (black / background).

use glam::{DAffine2, DVec2};
use rayon::prelude::*;

use common::Buffer2;

use crate::types::{ClassMask, RasterImage, Rgb};


/// Number of rows to process per parallel chunk.
const ROWS_PER_CHUNK: usize = 32;

/// Rotates `image` and `mask` by `angle_deg` around the buffer center.
///
/// Positive angles turn content counter-clockwise on screen. The output has
/// the input's size: content rotated off the canvas is lost and uncovered
/// areas are zero.
///
/// # Panics
///
/// Panics if `image` and `mask` differ in size.
pub fn rotate(image: &RasterImage, mask: &ClassMask, angle_deg: f64) -> (RasterImage, ClassMask) {
    assert_eq!(
        image.dimensions(),
        mask.dimensions(),
        "image and mask must have the same size"
    );

    let (width, height) = image.dimensions();
    let inverse = rotation_inverse(width, height, angle_deg);

    let rotated_image = fill_rows(width, height, |x, y| {
        let src = inverse.transform_point2(DVec2::new(x as f64, y as f64));
        bilinear_zero_border(image, src.x as f32, src.y as f32)
    });
    let rotated_mask = fill_rows(width, height, |x, y| {
        let src = inverse.transform_point2(DVec2::new(x as f64, y as f64));
        nearest_zero_border(mask, src)
    });

    (rotated_image, rotated_mask)
}

/// Maps output pixel positions back to source positions for a rotation by
/// `angle_deg` about the integer center `(width / 2, height / 2)`.
fn rotation_inverse(width: usize, height: usize, angle_deg: f64) -> DAffine2 {
    let center = DVec2::new((width / 2) as f64, (height / 2) as f64);
    DAffine2::from_translation(center)
        * DAffine2::from_angle(angle_deg.to_radians())
        * DAffine2::from_translation(-center)
}

/// Bilinear resize with half-pixel centers; edges are clamped.
///
/// # Panics
///
/// Panics if the source is empty and the target is not.
pub fn resize_image(image: &RasterImage, width: usize, height: usize) -> RasterImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    assert!(
        width * height == 0 || !image.is_empty(),
        "cannot resize an empty image to {}x{}",
        width,
        height
    );

    let scale_x = image.width() as f32 / width as f32;
    let scale_y = image.height() as f32 / height as f32;

    fill_rows(width, height, |x, y| {
        let src_x = (x as f32 + 0.5) * scale_x - 0.5;
        let src_y = (y as f32 + 0.5) * scale_y - 0.5;
        bilinear_clamped(image, src_x, src_y)
    })
}

/// Nearest-neighbor resize; every output value is copied from the source.
///
/// # Panics
///
/// Panics if the source is empty and the target is not.
pub fn resize_mask(mask: &ClassMask, width: usize, height: usize) -> ClassMask {
    if mask.dimensions() == (width, height) {
        return mask.clone();
    }
    assert!(
        width * height == 0 || !mask.is_empty(),
        "cannot resize an empty mask to {}x{}",
        width,
        height
    );

    let (src_w, src_h) = mask.dimensions();
    fill_rows(width, height, |x, y| {
        let src_x = (x * src_w / width).min(src_w - 1);
        let src_y = (y * src_h / height).min(src_h - 1);
        mask[(src_x, src_y)]
    })
}

/// Evaluates `f(x, y)` for every output pixel, in parallel row bands.
fn fill_rows<T, F>(width: usize, height: usize, f: F) -> Buffer2<T>
where
    T: Copy + Default + Send,
    F: Fn(usize, usize) -> T + Sync,
{
    let mut out = Buffer2::new_default(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    out.pixels_mut()
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, chunk)| {
            let first_row = chunk_idx * ROWS_PER_CHUNK;
            for (row_idx, row) in chunk.chunks_mut(width).enumerate() {
                let y = first_row + row_idx;
                for (x, px) in row.iter_mut().enumerate() {
                    *px = f(x, y);
                }
            }
        });

    out
}

#[inline]
fn pixel_or_zero(image: &RasterImage, x: i64, y: i64) -> [f32; 3] {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        [0.0; 3]
    } else {
        let px = image[(x as usize, y as usize)];
        [px[0] as f32, px[1] as f32, px[2] as f32]
    }
}

#[inline]
fn pixel_clamped(image: &RasterImage, x: i64, y: i64) -> [f32; 3] {
    let x = x.clamp(0, image.width() as i64 - 1);
    let y = y.clamp(0, image.height() as i64 - 1);
    pixel_or_zero(image, x, y)
}

#[inline]
fn lerp_rgb(p00: [f32; 3], p10: [f32; 3], p01: [f32; 3], p11: [f32; 3], fx: f32, fy: f32) -> Rgb {
    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] + fx * (p10[c] - p00[c]);
        let bottom = p01[c] + fx * (p11[c] - p01[c]);
        let value = top + fy * (bottom - top);
        out[c] = (value + 0.5).clamp(0.0, 255.0) as u8;
    }
    out
}

/// Bilinear sample treating everything outside the image as black.
#[inline]
fn bilinear_zero_border(image: &RasterImage, x: f32, y: f32) -> Rgb {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    lerp_rgb(
        pixel_or_zero(image, x0, y0),
        pixel_or_zero(image, x0 + 1, y0),
        pixel_or_zero(image, x0, y0 + 1),
        pixel_or_zero(image, x0 + 1, y0 + 1),
        fx,
        fy,
    )
}

/// Bilinear sample replicating edge pixels outside the image.
#[inline]
fn bilinear_clamped(image: &RasterImage, x: f32, y: f32) -> Rgb {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    lerp_rgb(
        pixel_clamped(image, x0, y0),
        pixel_clamped(image, x0 + 1, y0),
        pixel_clamped(image, x0, y0 + 1),
        pixel_clamped(image, x0 + 1, y0 + 1),
        fx,
        fy,
    )
}

#[inline]
fn nearest_zero_border(mask: &ClassMask, pos: DVec2) -> u8 {
    let x = pos.x.round();
    let y = pos.y.round();
    if x < 0.0 || y < 0.0 || x >= mask.width() as f64 || y >= mask.height() as f64 {
        0
    } else {
        mask[(x as usize, y as usize)]
    }
}
