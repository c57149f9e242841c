//! Clean background synthesis: cut the object out and patch the hole.

use rand::Rng;

use crate::error::ProcessError;
use crate::patch::find_patch;
use crate::types::{BinaryMask, ClassMask, RasterImage, Rect};


/// Builds an object-free version of `image`.
///
/// Pixels flagged in `object_mask` are blacked out, then the whole
/// `object_rect` is overwritten with a same-size patch copied from elsewhere
/// in `image`. The patch is located with [`find_patch`] against the full
/// class `mask`, excluding `object_rect` itself.
///
/// # Errors
///
/// [`ProcessError::PatchNotFound`] when the search exhausts `max_attempts`.
pub fn synthesize_background<R: Rng + ?Sized>(
    image: &RasterImage,
    mask: &ClassMask,
    object_mask: &BinaryMask,
    object_rect: &Rect,
    max_attempts: usize,
    rng: &mut R,
) -> Result<RasterImage, ProcessError> {
    assert_eq!(image.dimensions(), mask.dimensions(), "image/mask size mismatch");
    assert_eq!(
        image.dimensions(),
        object_mask.dimensions(),
        "image/object mask size mismatch"
    );

    let mut background = cut_out(image, object_mask);

    let patch = find_patch(
        mask,
        object_rect.width,
        object_rect.height,
        object_rect,
        max_attempts,
        rng,
    )
    .ok_or(ProcessError::PatchNotFound {
        width: object_rect.width,
        height: object_rect.height,
        attempts: max_attempts,
    })?;

    tracing::debug!(%patch, "Background patch");

    let fill = image.crop(patch.x, patch.y, patch.width, patch.height);
    background.blit(&fill, object_rect.x, object_rect.y);

    Ok(background)
}

/// Copy of `image` with every flagged pixel set to black.
pub fn cut_out(image: &RasterImage, object_mask: &BinaryMask) -> RasterImage {
    let mut out = image.clone();
    for (px, &is_object) in out.iter_mut().zip(object_mask.iter()) {
        if is_object {
            *px = [0; 3];
        }
    }
    out
}
