//! Object extraction: class mask -> binary object mask -> bounding box -> crops.

use crate::error::ProcessError;
use crate::types::{BinaryMask, ClassMask, ForegroundClasses, RasterImage, Rect};


/// The object cut out of one source image.
#[derive(Debug, Clone)]
pub struct ExtractedObject {
    /// Full-canvas flags of pixels belonging to the foreground classes.
    pub object_mask: BinaryMask,
    /// Tight bounding box of `object_mask`.
    pub rect: Rect,
    /// Source image cropped to `rect`.
    pub image: RasterImage,
    /// Original class ids cropped to `rect`, including any non-foreground ids
    /// that fall inside the box.
    pub class_mask: ClassMask,
}

/// Flags every cell whose class id is in `classes`.
pub fn object_mask(mask: &ClassMask, classes: &ForegroundClasses) -> BinaryMask {
    mask.map(|&c| classes.contains(c))
}

/// Tight axis-aligned box around all set cells, or `None` if none are set.
pub fn bounding_rect(mask: &BinaryMask) -> Option<Rect> {
    let mut min_x = usize::MAX;
    let mut min_y = usize::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;

    for (y, row) in mask.rows().enumerate() {
        let Some(first) = row.iter().position(|&set| set) else {
            continue;
        };
        // a row with a first set cell also has a last one
        let last = row.iter().rposition(|&set| set).unwrap_or(first);

        found = true;
        min_x = min_x.min(first);
        max_x = max_x.max(last);
        min_y = min_y.min(y);
        max_y = y;
    }

    found.then(|| Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Locates the object made of `classes` and crops it out of `image` and `mask`.
///
/// # Errors
///
/// [`ProcessError::NoObjectFound`] when no cell belongs to `classes`.
///
/// # Panics
///
/// Panics if `image` and `mask` differ in size.
pub fn extract_object(
    image: &RasterImage,
    mask: &ClassMask,
    classes: &ForegroundClasses,
) -> Result<ExtractedObject, ProcessError> {
    assert_eq!(
        image.dimensions(),
        mask.dimensions(),
        "image and mask must have the same size"
    );

    let object_mask = object_mask(mask, classes);
    let rect = bounding_rect(&object_mask).ok_or_else(|| ProcessError::NoObjectFound {
        classes: classes.ids(),
    })?;

    tracing::debug!(%rect, "Object bounding box");

    Ok(ExtractedObject {
        image: image.crop(rect.x, rect.y, rect.width, rect.height),
        class_mask: mask.crop(rect.x, rect.y, rect.width, rect.height),
        object_mask,
        rect,
    })
}
