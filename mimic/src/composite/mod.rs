//! Variation compositing: rotate the object, pick a spot, hard-paste it.

use rand::Rng;

use crate::transform::rotate;
use crate::types::{ClassMask, RasterImage, RotationRange};


/// How a paste position was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Uniformly random position with the object fully inside the canvas.
    Random,
    /// The object did not fit with room to spare, so it was centered and
    /// clipped to the canvas.
    Centered,
}

/// One synthesized sample.
#[derive(Debug, Clone)]
pub struct Variation {
    pub image: RasterImage,
    /// Zero except where the object landed, which carries its class ids.
    pub mask: ClassMask,
    /// Rotation applied to the object, in degrees.
    pub angle: f64,
    /// Canvas position of the rotated object's top-left corner.
    pub position: (usize, usize),
    pub placement: Placement,
}

/// Pastes `object_image` rotated by an angle drawn from `rotation` onto a copy
/// of `background`.
///
/// # Panics
///
/// Panics if `rotation` is empty or the object image and mask differ in size.
pub fn composite<R: Rng + ?Sized>(
    background: &RasterImage,
    object_image: &RasterImage,
    object_mask: &ClassMask,
    rotation: RotationRange,
    rng: &mut R,
) -> Variation {
    let angle = rng.random_range(rotation.min..rotation.max);
    composite_at_angle(background, object_image, object_mask, angle, rng)
}

/// [`composite`] with a fixed rotation angle. `rng` only drives placement.
pub fn composite_at_angle<R: Rng + ?Sized>(
    background: &RasterImage,
    object_image: &RasterImage,
    object_mask: &ClassMask,
    angle: f64,
    rng: &mut R,
) -> Variation {
    let (rotated_image, rotated_mask) = rotate(object_image, object_mask, angle);

    let (position, placement) =
        choose_position(background.dimensions(), rotated_image.dimensions(), rng);

    let mut image = background.clone();
    let mut mask = ClassMask::new_default(background.width(), background.height());
    paste(&mut image, &mut mask, &rotated_image, &rotated_mask, position);

    tracing::trace!(angle, ?position, ?placement, "Composited variation");

    Variation {
        image,
        mask,
        angle,
        position,
        placement,
    }
}

/// Picks the top-left paste corner for an `object`-sized block on `canvas`
/// (both `(width, height)`).
///
/// Random over `[0, W - w] x [0, H - h]` when the object is strictly smaller
/// on both axes, otherwise centered with negative offsets clamped to 0.
pub fn choose_position<R: Rng + ?Sized>(
    canvas: (usize, usize),
    object: (usize, usize),
    rng: &mut R,
) -> ((usize, usize), Placement) {
    let (canvas_w, canvas_h) = canvas;
    let (object_w, object_h) = object;

    if canvas_w > object_w && canvas_h > object_h {
        let x = rng.random_range(0..=canvas_w - object_w);
        let y = rng.random_range(0..=canvas_h - object_h);
        ((x, y), Placement::Random)
    } else {
        let x = canvas_w.saturating_sub(object_w) / 2;
        let y = canvas_h.saturating_sub(object_h) / 2;
        ((x, y), Placement::Centered)
    }
}

/// Copies every nonzero-class pixel of the object into `image` and `mask` at
/// `position`, clipped to the canvas. Other pixels are left untouched.
pub fn paste(
    image: &mut RasterImage,
    mask: &mut ClassMask,
    object_image: &RasterImage,
    object_mask: &ClassMask,
    position: (usize, usize),
) {
    assert_eq!(image.dimensions(), mask.dimensions(), "canvas size mismatch");
    assert_eq!(
        object_image.dimensions(),
        object_mask.dimensions(),
        "object size mismatch"
    );

    let (x0, y0) = position;
    let visible_w = object_mask.width().min(image.width().saturating_sub(x0));
    let visible_h = object_mask.height().min(image.height().saturating_sub(y0));
    if visible_w == 0 || visible_h == 0 {
        return;
    }

    for row in 0..visible_h {
        let src_classes = &object_mask.row(row)[..visible_w];
        let src_pixels = &object_image.row(row)[..visible_w];
        let dst_classes = &mut mask.row_mut(y0 + row)[x0..x0 + visible_w];

        for (col, (&class, dst_class)) in src_classes.iter().zip(dst_classes).enumerate() {
            if class != 0 {
                *dst_class = class;
                image[(x0 + col, y0 + row)] = src_pixels[col];
            }
        }
    }
}
