//! Synthetic training-sample generator for segmentation datasets.
//!
//! Given photos and per-pixel class masks, the engine cuts the foreground
//! object out of each photo, repairs the hole with a patch of clean
//! background, then pastes randomly rotated and positioned copies of the
//! object back in. Every output image comes with a class mask that follows
//! the object to its new place.
//!
//! # Pipeline Stages
//!
//! 1. **Extraction** ([`extract`]) - bounding box and crops of the object
//! 2. **Background** ([`background`]) - object-free image via patch search ([`patch`])
//! 3. **Compositing** ([`composite`]) - rotation ([`transform`]) and hard paste
//! 4. **Batch** ([`batch`]) - pairing, resizing, error isolation, statistics
//!
//! Buffers come from a [`Collection`] and go to an [`OutputSink`]; both have
//! in-memory and directory implementations in [`io`].

pub mod background;
pub mod batch;
pub mod composite;
pub mod config;
pub mod error;
pub mod extract;
pub mod io;
pub mod patch;
pub mod preview;
pub mod transform;
pub mod types;

#[cfg(test)]
mod testing;

pub use batch::{Generator, Progress, ProgressLog, RunStats, TracingProgress};
pub use common::CancelToken;
pub use composite::{Placement, Variation};
pub use config::Config;
pub use error::{ConfigError, DecodeError, Error, ProcessError, Result, SinkError};
pub use extract::ExtractedObject;
pub use io::{Collection, OutputKind, OutputSink};
pub use types::{BinaryMask, ClassMask, ForegroundClasses, RasterImage, Rect, Rgb, RotationRange};
