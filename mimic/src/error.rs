//! Error types for sample generation.
//!
//! Only [`Error`] ever escapes a batch run. Per-image failures are
//! [`ProcessError`]s and per-variation failures are [`SinkError`]s; both are
//! reported through the progress sink and folded into the run statistics.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid generator configuration. Fatal, detected before any image is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Canvas size must be non-zero, got {width}x{height}")]
    ZeroCanvas { width: usize, height: usize },

    #[error("Foreground class set is empty")]
    EmptyForeground,

    #[error("Class 0 is background and cannot be a foreground class")]
    BackgroundInForeground,

    #[error("Invalid rotation range [{min}, {max}): bounds must be finite with max > min")]
    InvalidRotationRange { min: f64, max: f64 },

    #[error("max_patch_attempts must be > 0")]
    ZeroPatchAttempts,

    #[error("max_parallel_variations must be > 0")]
    ZeroParallelism,

    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yml::Error),
}

/// A collection could not produce a decoded buffer for a name.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("No entry named '{0}'")]
    NotFound(String),

    #[error("Failed to decode '{name}': {source}")]
    Image {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to decode '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

/// An output sink refused or failed to store an artifact.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to create output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Output '{name}' rejected: {reason}")]
    Rejected { name: String, reason: String },
}

/// Failure of one source image. The batch skips the image and moves on.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("No mask found for '{image}'")]
    MissingPairing { image: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("No object found in mask (no pixel of classes {classes:?})")]
    NoObjectFound { classes: Vec<u8> },

    #[error("No {width}x{height} background patch found in {attempts} attempts")]
    PatchNotFound {
        width: usize,
        height: usize,
        attempts: usize,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Fatal batch error. Raised before processing begins.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Output destination is not writable: {0}")]
    Output(#[source] SinkError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
