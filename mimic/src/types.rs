//! Buffer aliases and small geometry/value types used across the engine.

use std::fmt;

use common::Buffer2;
use serde::{Deserialize, Serialize};

/// One 8-bit RGB sample.
pub type Rgb = [u8; 3];

/// Color raster image, row-major, 3 channels of `u8`.
pub type RasterImage = Buffer2<Rgb>;

/// Per-pixel class ids; 0 is background.
pub type ClassMask = Buffer2<u8>;

/// Foreground/background flags derived from a [`ClassMask`].
pub type BinaryMask = Buffer2<bool>;

/// Axis-aligned rectangle in pixel coordinates, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Half-open interval overlap test on both axes.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// True when the rectangle lies inside a `width` x `height` canvas.
    #[inline]
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x={}, y={}, w={}, h={}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Membership table for the class ids treated as the object.
#[derive(Clone, PartialEq, Eq)]
pub struct ForegroundClasses {
    table: [bool; 256],
}

impl ForegroundClasses {
    pub fn new(ids: &[u8]) -> Self {
        let mut table = [false; 256];
        for &id in ids {
            table[id as usize] = true;
        }
        Self { table }
    }

    #[inline]
    pub fn contains(&self, class_id: u8) -> bool {
        self.table[class_id as usize]
    }

    pub fn is_empty(&self) -> bool {
        !self.table.iter().any(|&t| t)
    }

    /// The member ids in ascending order.
    pub fn ids(&self) -> Vec<u8> {
        (0..=u8::MAX).filter(|&id| self.contains(id)).collect()
    }
}

impl fmt::Debug for ForegroundClasses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ForegroundClasses").field(&self.ids()).finish()
    }
}

/// Rotation angles in degrees, sampled from the half-open range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationRange {
    pub min: f64,
    pub max: f64,
}

impl RotationRange {
    pub const FULL: RotationRange = RotationRange {
        min: -180.0,
        max: 180.0,
    };

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A usable range has finite bounds and `max > min`.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.max > self.min
    }
}

impl Default for RotationRange {
    fn default() -> Self {
        Self::FULL
    }
}
