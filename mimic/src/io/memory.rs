use std::collections::BTreeMap;

use crate::error::{DecodeError, SinkError};
use crate::io::{Collection, OutputKind, OutputSink};
use crate::types::{ClassMask, RasterImage};

/// Collection backed by a map of already decoded buffers.
///
/// Entries can also hold a decode failure message to stand in for a file
/// that exists but cannot be read.
#[derive(Debug, Clone)]
pub struct MemoryCollection<T> {
    entries: BTreeMap<String, Result<T, String>>,
}

impl<T> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> MemoryCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, item: T) -> &mut Self {
        self.entries.insert(name.into(), Ok(item));
        self
    }

    /// Adds an entry whose `load` fails with `reason`.
    pub fn insert_corrupt(&mut self, name: impl Into<String>, reason: impl Into<String>) -> &mut Self {
        self.entries.insert(name.into(), Err(reason.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T, N: Into<String>> FromIterator<(N, T)> for MemoryCollection<T> {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, item)| (name.into(), Ok(item)))
                .collect(),
        }
    }
}

impl<T: Clone> Collection for MemoryCollection<T> {
    type Item = T;

    fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn load(&self, name: &str) -> Result<T, DecodeError> {
        match self.entries.get(name) {
            Some(Ok(item)) => Ok(item.clone()),
            Some(Err(reason)) => Err(DecodeError::Invalid {
                name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(DecodeError::NotFound(name.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub kind: OutputKind,
    pub name: String,
    pub image: RasterImage,
}

#[derive(Debug, Clone)]
pub struct StoredMask {
    pub name: String,
    pub mask: ClassMask,
}

/// Sink that keeps every artifact in memory, in write order.
///
/// Names listed via [`MemorySink::reject`] fail to write, which lets callers
/// exercise per-output failure handling.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub images: Vec<StoredImage>,
    pub masks: Vec<StoredMask>,
    rejected: Vec<String>,
    fail_prepare: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes writes of `name` fail.
    pub fn reject(&mut self, name: impl Into<String>) -> &mut Self {
        self.rejected.push(name.into());
        self
    }

    /// Makes [`OutputSink::prepare`] fail.
    pub fn fail_prepare(&mut self) -> &mut Self {
        self.fail_prepare = true;
        self
    }

    pub fn image(&self, name: &str) -> Option<&RasterImage> {
        self.images.iter().find(|s| s.name == name).map(|s| &s.image)
    }

    pub fn mask(&self, name: &str) -> Option<&ClassMask> {
        self.masks.iter().find(|s| s.name == name).map(|s| &s.mask)
    }

    pub fn count(&self, kind: OutputKind) -> usize {
        self.images.iter().filter(|s| s.kind == kind).count()
    }

    fn check(&self, name: &str) -> Result<(), SinkError> {
        if self.rejected.iter().any(|r| r == name) {
            return Err(SinkError::Rejected {
                name: name.to_string(),
                reason: "rejected by sink".to_string(),
            });
        }
        Ok(())
    }
}

impl OutputSink for MemorySink {
    fn prepare(&mut self) -> Result<(), SinkError> {
        if self.fail_prepare {
            return Err(SinkError::Rejected {
                name: "<sink>".to_string(),
                reason: "destination unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn write_image(
        &mut self,
        kind: OutputKind,
        name: &str,
        image: &RasterImage,
    ) -> Result<(), SinkError> {
        self.check(name)?;
        self.images.push(StoredImage {
            kind,
            name: name.to_string(),
            image: image.clone(),
        });
        Ok(())
    }

    fn write_mask(&mut self, name: &str, mask: &ClassMask) -> Result<(), SinkError> {
        self.check(name)?;
        self.masks.push(StoredMask {
            name: name.to_string(),
            mask: mask.clone(),
        });
        Ok(())
    }
}
