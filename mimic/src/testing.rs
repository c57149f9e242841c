//! Synthetic buffers shared by unit tests.

use common::Buffer2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::{ClassMask, RasterImage, Rect};

/// Smooth color ramp; neighboring pixels differ, no pixel is pure magenta.
pub fn gradient_image(width: usize, height: usize) -> RasterImage {
    Buffer2::from_fn(width, height, |x, y| {
        [
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + 2 * y) % 256) as u8,
        ]
    })
}

/// Mask whose cells are drawn uniformly from `classes`.
pub fn noise_mask(width: usize, height: usize, classes: &[u8], seed: u64) -> ClassMask {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Buffer2::from_fn(width, height, |_, _| {
        classes[rng.random_range(0..classes.len())]
    })
}

/// Zero mask with each `(rect, class)` painted in order; later rects win.
pub fn mask_with_rects(width: usize, height: usize, rects: &[(Rect, u8)]) -> ClassMask {
    let mut mask = ClassMask::new_default(width, height);
    for &(rect, class) in rects {
        for y in rect.y..rect.bottom().min(height) {
            for x in rect.x..rect.right().min(width) {
                mask[(x, y)] = class;
            }
        }
    }
    mask
}
