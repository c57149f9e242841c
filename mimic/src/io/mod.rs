//! Boundary between the engine and wherever buffers come from and go to.
//!
//! A [`Collection`] lists names and decodes buffers on demand; an
//! [`OutputSink`] stores finished artifacts. In-memory adapters serve tests
//! and embedding callers, directory adapters read and write image files.

mod dir;
mod memory;


pub use dir::{
    raster_from_rgb, raster_to_rgb, validate_dirs, DirImages, DirMasks, DirSink, DirValidation,
};
pub use memory::{MemoryCollection, MemorySink, StoredImage, StoredMask};

use crate::error::{DecodeError, SinkError};
use crate::types::{ClassMask, RasterImage};

/// Named, lazily decoded buffers.
pub trait Collection {
    type Item;

    /// All entry names, in any order.
    fn names(&self) -> Vec<String>;

    fn load(&self, name: &str) -> Result<Self::Item, DecodeError>;
}

/// Which family an output image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Object-free background of a source image.
    Background,
    /// Synthesized sample with a pasted object.
    Variation,
}

/// Receives generated artifacts. Names carry no file extension.
pub trait OutputSink {
    /// Called once before processing starts. A failure aborts the batch.
    fn prepare(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn write_image(
        &mut self,
        kind: OutputKind,
        name: &str,
        image: &RasterImage,
    ) -> Result<(), SinkError>;

    fn write_mask(&mut self, name: &str, mask: &ClassMask) -> Result<(), SinkError>;
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn prepare(&mut self) -> Result<(), SinkError> {
        (**self).prepare()
    }

    fn write_image(
        &mut self,
        kind: OutputKind,
        name: &str,
        image: &RasterImage,
    ) -> Result<(), SinkError> {
        (**self).write_image(kind, name, image)
    }

    fn write_mask(&mut self, name: &str, mask: &ClassMask) -> Result<(), SinkError> {
        (**self).write_mask(name, mask)
    }
}

/// Output name of the clean background of `base`.
pub fn background_name(base: &str) -> String {
    format!("background_{base}")
}

/// Output name of the all-zero mask paired with the clean background.
pub fn background_mask_name(base: &str) -> String {
    format!("background_mask_{base}")
}

/// Output name of variation `index` (1-based) of `base`.
pub fn variation_name(base: &str, index: usize) -> String {
    format!("{base}_var{index}")
}

/// Output name of the mask of variation `index` (1-based) of `base`.
pub fn variation_mask_name(base: &str, index: usize) -> String {
    format!("{base}_var{index}_mask")
}
