use std::io;
use std::path::{Path, PathBuf};

use common::file_utils::{files_with_extensions, IMAGE_EXTENSIONS};
use common::Buffer2;

use crate::error::{DecodeError, SinkError};
use crate::io::{Collection, OutputKind, OutputSink};
use crate::types::{ClassMask, RasterImage};

/// Lists the image files of `dir` by file name. Names that are not valid
/// UTF-8 cannot be addressed through [`Collection`] and are skipped.
fn list_image_names(dir: &Path) -> io::Result<Vec<String>> {
    Ok(files_with_extensions(dir, IMAGE_EXTENSIONS)?
        .into_iter()
        .filter_map(|path| match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => Some(name.to_string()),
            None => {
                tracing::warn!(path = %path.display(), "Skipping file with a non UTF-8 name");
                None
            }
        })
        .collect())
}

fn open(dir: &Path, name: &str) -> Result<image::DynamicImage, DecodeError> {
    image::open(dir.join(name)).map_err(|source| DecodeError::Image {
        name: name.to_string(),
        source,
    })
}

/// Color images in a directory (png/jpg/jpeg), decoded as 8-bit RGB.
#[derive(Debug, Clone)]
pub struct DirImages {
    dir: PathBuf,
    names: Vec<String>,
}

impl DirImages {
    pub fn open<P: Into<PathBuf>>(dir: P) -> io::Result<Self> {
        let dir = dir.into();
        let names = list_image_names(&dir)?;
        Ok(Self { dir, names })
    }
}

impl Collection for DirImages {
    type Item = RasterImage;

    fn names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn load(&self, name: &str) -> Result<RasterImage, DecodeError> {
        Ok(raster_from_rgb(open(&self.dir, name)?.into_rgb8()))
    }
}

/// Class masks in a directory, decoded as 8-bit grayscale where the gray
/// level is the class id.
#[derive(Debug, Clone)]
pub struct DirMasks {
    dir: PathBuf,
    names: Vec<String>,
}

impl DirMasks {
    pub fn open<P: Into<PathBuf>>(dir: P) -> io::Result<Self> {
        let dir = dir.into();
        let names = list_image_names(&dir)?;
        Ok(Self { dir, names })
    }
}

impl Collection for DirMasks {
    type Item = ClassMask;

    fn names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn load(&self, name: &str) -> Result<ClassMask, DecodeError> {
        let gray = open(&self.dir, name)?.into_luma8();
        let (width, height) = gray.dimensions();
        Ok(Buffer2::new(
            width as usize,
            height as usize,
            gray.into_raw(),
        ))
    }
}

pub fn raster_from_rgb(rgb: image::RgbImage) -> RasterImage {
    let (width, height) = rgb.dimensions();
    let pixels = rgb.pixels().map(|p| p.0).collect();
    Buffer2::new(width as usize, height as usize, pixels)
}

pub fn raster_to_rgb(raster: &RasterImage) -> Option<image::RgbImage> {
    let bytes: Vec<u8> = raster.iter().flatten().copied().collect();
    image::RgbImage::from_raw(raster.width() as u32, raster.height() as u32, bytes)
}

/// Writes PNG files under an output root:
///
/// ```text
/// <root>/clean_backgrounds/<name>.png
/// <root>/variations/<name>.png
/// <root>/masks/<name>.png
/// ```
#[derive(Debug, Clone)]
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub const BACKGROUNDS_DIR: &'static str = "clean_backgrounds";
    pub const VARIATIONS_DIR: &'static str = "variations";
    pub const MASKS_DIR: &'static str = "masks";

    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn image_path(&self, kind: OutputKind, name: &str) -> PathBuf {
        let sub = match kind {
            OutputKind::Background => Self::BACKGROUNDS_DIR,
            OutputKind::Variation => Self::VARIATIONS_DIR,
        };
        self.root.join(sub).join(format!("{name}.png"))
    }

    pub fn mask_path(&self, name: &str) -> PathBuf {
        self.root.join(Self::MASKS_DIR).join(format!("{name}.png"))
    }
}

impl OutputSink for DirSink {
    fn prepare(&mut self) -> Result<(), SinkError> {
        for sub in [Self::BACKGROUNDS_DIR, Self::VARIATIONS_DIR, Self::MASKS_DIR] {
            let path = self.root.join(sub);
            std::fs::create_dir_all(&path).map_err(|source| SinkError::CreateDir { path, source })?;
        }
        Ok(())
    }

    fn write_image(
        &mut self,
        kind: OutputKind,
        name: &str,
        image: &RasterImage,
    ) -> Result<(), SinkError> {
        let path = self.image_path(kind, name);
        let rgb = raster_to_rgb(image).ok_or_else(|| SinkError::Rejected {
            name: name.to_string(),
            reason: "pixel buffer does not match its dimensions".to_string(),
        })?;
        rgb.save(&path)
            .map_err(|source| SinkError::Write { path, source })
    }

    fn write_mask(&mut self, name: &str, mask: &ClassMask) -> Result<(), SinkError> {
        let path = self.mask_path(name);
        let gray = image::GrayImage::from_raw(
            mask.width() as u32,
            mask.height() as u32,
            mask.pixels().to_vec(),
        )
        .ok_or_else(|| SinkError::Rejected {
            name: name.to_string(),
            reason: "mask buffer does not match its dimensions".to_string(),
        })?;
        gray.save(&path)
            .map_err(|source| SinkError::Write { path, source })
    }
}

/// Pre-flight report on input and output directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub image_count: usize,
    pub mask_count: usize,
}

impl DirValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks that the input directories exist and hold images, and that the
/// output directory can be created.
pub fn validate_dirs(image_dir: &Path, mask_dir: &Path, output_dir: &Path) -> DirValidation {
    let mut report = DirValidation::default();

    if !image_dir.is_dir() {
        report
            .errors
            .push(format!("Image directory does not exist: {}", image_dir.display()));
    }
    if !mask_dir.is_dir() {
        report
            .errors
            .push(format!("Mask directory does not exist: {}", mask_dir.display()));
    }
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        report.errors.push(format!(
            "Cannot create output directory {}: {}",
            output_dir.display(),
            e
        ));
    }
    if !report.is_valid() {
        return report;
    }

    match list_image_names(image_dir) {
        Ok(names) => report.image_count = names.len(),
        Err(e) => report.errors.push(format!("Cannot list {}: {}", image_dir.display(), e)),
    }
    match list_image_names(mask_dir) {
        Ok(names) => report.mask_count = names.len(),
        Err(e) => report.errors.push(format!("Cannot list {}: {}", mask_dir.display(), e)),
    }

    if report.image_count == 0 {
        report.errors.push("No images found in the image directory".to_string());
    }
    if report.mask_count == 0 {
        report.errors.push("No masks found in the mask directory".to_string());
    }
    if report.image_count != report.mask_count {
        report.warnings.push(format!(
            "Image count ({}) differs from mask count ({})",
            report.image_count, report.mask_count
        ));
    }

    report
}
