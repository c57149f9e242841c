//! Contact-sheet style previews of generated samples.

use common::parallel::par_map_limited;

use crate::transform::resize_image;
use crate::types::{ClassMask, RasterImage};

/// Default thumbnail size used by callers that have no preference.
pub const THUMB_SIZE: (usize, usize) = (200, 150);

const MAX_CONCURRENT_THUMBS: usize = 4;

/// Tiles thumbnails of the first `rows * cols` images row-major into one image.
///
/// Cells without an image stay black, as do thumbnails of empty images.
/// Returns `None` when there is nothing to show or the grid has no cells.
pub fn preview_grid(
    images: &[RasterImage],
    rows: usize,
    cols: usize,
    thumb_width: usize,
    thumb_height: usize,
) -> Option<RasterImage> {
    let cells = rows * cols;
    if images.is_empty() || cells == 0 || thumb_width == 0 || thumb_height == 0 {
        return None;
    }

    let shown = &images[..images.len().min(cells)];
    let thumbs = par_map_limited(shown, MAX_CONCURRENT_THUMBS, |image| {
        (!image.is_empty()).then(|| resize_image(image, thumb_width, thumb_height))
    });

    let mut grid = RasterImage::new_default(cols * thumb_width, rows * thumb_height);
    for (cell, thumb) in thumbs.iter().enumerate() {
        if let Some(thumb) = thumb {
            grid.blit(thumb, (cell % cols) * thumb_width, (cell / cols) * thumb_height);
        }
    }
    Some(grid)
}

/// Renders class ids as gray levels, the highest id present at full white.
pub fn mask_preview(mask: &ClassMask) -> RasterImage {
    let max_class = mask.iter().copied().max().unwrap_or(0);
    if max_class == 0 {
        return RasterImage::new_default(mask.width(), mask.height());
    }
    mask.map(|&class| {
        let level = (class as u32 * 255 / max_class as u32) as u8;
        [level; 3]
    })
}
