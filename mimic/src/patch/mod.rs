//! Random search for a background-only rectangle.
//!
//! The search is bounded rejection sampling: it may miss a valid patch that
//! exists, so callers must treat `None` as a normal outcome.

use rand::Rng;

use crate::types::{ClassMask, Rect};


/// Looks for a `width` x `height` region of `mask` that does not overlap
/// `exclude` and contains only class 0.
///
/// Candidate top-left corners are drawn uniformly from
/// `[0, mask_w - width] x [0, mask_h - height]`. Any nonzero class disqualifies
/// a candidate, not only foreground classes. Returns the first accepted
/// rectangle, or `None` after `max_attempts` rejected draws.
pub fn find_patch<R: Rng + ?Sized>(
    mask: &ClassMask,
    width: usize,
    height: usize,
    exclude: &Rect,
    max_attempts: usize,
    rng: &mut R,
) -> Option<Rect> {
    if width > mask.width() || height > mask.height() {
        return None;
    }

    let max_x = mask.width() - width;
    let max_y = mask.height() - height;

    for _ in 0..max_attempts {
        let candidate = Rect::new(
            rng.random_range(0..=max_x),
            rng.random_range(0..=max_y),
            width,
            height,
        );

        if candidate.overlaps(exclude) {
            continue;
        }
        if is_background(mask, &candidate) {
            return Some(candidate);
        }
    }

    None
}

/// True when every cell of `rect` in `mask` is class 0.
pub fn is_background(mask: &ClassMask, rect: &Rect) -> bool {
    debug_assert!(rect.fits_within(mask.width(), mask.height()));
    (rect.y..rect.bottom()).all(|y| mask.row(y)[rect.x..rect.right()].iter().all(|&c| c == 0))
}
