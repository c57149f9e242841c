//! Batch orchestration.
//!
//! [`Generator::run`] drives every selected source image through the pipeline:
//!
//! 1. **Pairing** - find the mask with the same base name
//! 2. **Normalization** - resize image (bilinear) and mask (nearest) to the canvas
//! 3. **Extraction** - locate and crop the foreground object
//! 4. **Background** - patch the object region with a clean background sample
//! 5. **Variations** - paste randomly rotated copies of the object
//!
//! A failing image is reported and skipped; only configuration problems and an
//! unusable output destination abort a run.

mod progress;

pub use progress::{Progress, ProgressLog, TracingProgress};

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use common::file_utils::file_stem;
use common::parallel::par_map_streamed;
use common::{Buffer2, CancelToken};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::background::synthesize_background;
use crate::composite::{composite, Variation};
use crate::config::Config;
use crate::error::{ConfigError, DecodeError, Error, ProcessError, Result, SinkError};
use crate::extract::extract_object;
use crate::io::{
    background_mask_name, background_name, variation_mask_name, variation_name, Collection,
    OutputKind, OutputSink,
};
use crate::transform::{resize_image, resize_mask};
use crate::types::{ClassMask, ForegroundClasses, RasterImage};

#[cfg(test)]
mod tests;

/// Counters accumulated over one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Source images discovered, before the `num_backgrounds` cut.
    pub total_images_found: usize,
    pub images_processed: usize,
    pub images_with_errors: usize,
    /// Variations whose image and mask were both written.
    pub total_variations_created: usize,
    /// The run stopped early on a cancellation request.
    pub cancelled: bool,
}

/// Outcome of one successfully processed image.
struct ImageOutcome {
    variations_created: usize,
    cancelled: bool,
}

/// Validated configuration bound to the batch pipeline.
#[derive(Debug, Clone)]
pub struct Generator {
    config: Config,
    classes: ForegroundClasses,
}

impl Generator {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let classes = config.foreground();
        Ok(Self { config, classes })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Processes the first `num_backgrounds` images (by name) of `images`.
    ///
    /// Without a `progress` sink, lines go to [`TracingProgress`]. `cancel` is
    /// polled before every image and every chunk of variations; a cancelled
    /// run still returns its statistics.
    ///
    /// # Errors
    ///
    /// [`Error::Output`] when `sink` cannot be prepared. Nothing else fails
    /// the run.
    pub fn run<I, M, S>(
        &self,
        images: &I,
        masks: &M,
        sink: &mut S,
        progress: Option<&dyn Progress>,
        cancel: &CancelToken,
    ) -> Result<RunStats>
    where
        I: Collection<Item = RasterImage>,
        M: Collection<Item = ClassMask>,
        S: OutputSink + ?Sized,
    {
        let progress = progress.unwrap_or(&TracingProgress);

        sink.prepare().map_err(Error::Output)?;

        let mut image_names = images.names();
        image_names.sort();
        let mut mask_names = masks.names();
        mask_names.sort();

        let mut stats = RunStats {
            total_images_found: image_names.len(),
            ..RunStats::default()
        };
        progress.report(&format!("Found {} images to process", image_names.len()));

        let mut master = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        let selected = &image_names[..image_names.len().min(self.config.num_backgrounds)];
        for (first, second) in shared_stems(selected) {
            tracing::warn!(first, second, "Images share an output base name");
            let base = file_stem(first);
            progress.report(&format!(
                "Warning: {first} and {second} share the base name '{base}', \
                 outputs of {second} overwrite {first}"
            ));
        }

        for (index, name) in selected.iter().enumerate() {
            if cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            let seed: u64 = master.random();
            let step = format!("[{}/{}] {name}", index + 1, selected.len());
            progress.report(&format!("{step}: processing"));
            let job = ImageJob {
                name,
                step: &step,
                seed,
                mask_names: &mask_names,
            };

            match self.process_image(&job, images, masks, sink, progress, cancel) {
                Ok(outcome) => {
                    stats.images_processed += 1;
                    stats.total_variations_created += outcome.variations_created;
                    progress.report(&format!(
                        "{step}: done, {} variations created",
                        outcome.variations_created
                    ));
                    if outcome.cancelled {
                        stats.cancelled = true;
                        break;
                    }
                }
                Err(e) => {
                    stats.images_with_errors += 1;
                    tracing::warn!(image = %name, error = %e, "Image skipped");
                    progress.report(&format!("{step}: error: {e}"));
                }
            }
        }

        report_summary(progress, &stats);
        Ok(stats)
    }

    fn process_image<I, M, S>(
        &self,
        job: &ImageJob<'_>,
        images: &I,
        masks: &M,
        sink: &mut S,
        progress: &dyn Progress,
        cancel: &CancelToken,
    ) -> Result<ImageOutcome, ProcessError>
    where
        I: Collection<Item = RasterImage>,
        M: Collection<Item = ClassMask>,
        S: OutputSink + ?Sized,
    {
        let mask_name =
            find_mask(job.name, job.mask_names).ok_or_else(|| ProcessError::MissingPairing {
                image: job.name.to_string(),
            })?;

        let (width, height) = (self.config.canvas_width, self.config.canvas_height);
        let image = resize_image(&non_empty(job.name, images.load(job.name)?)?, width, height);
        let mask = resize_mask(&non_empty(mask_name, masks.load(mask_name)?)?, width, height);

        let object = extract_object(&image, &mask, &self.classes)?;
        progress.report(&format!("{}: object bbox {}", job.step, object.rect));

        let mut rng = ChaCha8Rng::seed_from_u64(job.seed);
        let background = synthesize_background(
            &image,
            &mask,
            &object.object_mask,
            &object.rect,
            self.config.max_patch_attempts,
            &mut rng,
        )?;

        let base = file_stem(job.name);
        sink.write_image(OutputKind::Background, &background_name(base), &background)?;
        sink.write_mask(
            &background_mask_name(base),
            &ClassMask::new_default(width, height),
        )?;
        tracing::info!(image = %job.name, rect = %object.rect, "Clean background written");

        let indices: Vec<usize> = (1..=self.config.variations_per_background).collect();
        let mut variations_created = 0;
        let attempted = par_map_streamed(
            &indices,
            self.config.max_parallel_variations,
            |&index| {
                let mut rng = ChaCha8Rng::seed_from_u64(job.seed);
                rng.set_stream(index as u64);
                composite(
                    &background,
                    &object.image,
                    &object.class_mask,
                    self.config.rotation_range,
                    &mut rng,
                )
            },
            |&index, variation| match write_variation(sink, base, index, &variation) {
                Ok(()) => variations_created += 1,
                Err(e) => {
                    tracing::warn!(image = %job.name, index, error = %e, "Variation skipped");
                    progress.report(&format!("{}: variation {index} failed: {e}", job.step));
                }
            },
            || !cancel.is_cancelled(),
        );

        Ok(ImageOutcome {
            variations_created,
            cancelled: attempted < indices.len(),
        })
    }
}

/// Per-image inputs that do not come from the configuration.
struct ImageJob<'a> {
    name: &'a str,
    /// Progress prefix, `[index/total] name`.
    step: &'a str,
    seed: u64,
    mask_names: &'a [String],
}

/// First mask (in sorted order) whose base name equals the image's.
fn find_mask<'a>(image_name: &str, mask_names: &'a [String]) -> Option<&'a str> {
    let stem = file_stem(image_name);
    mask_names
        .iter()
        .map(String::as_str)
        .find(|mask| file_stem(mask) == stem)
}

/// Pairs of selected images whose outputs would be written under the same name.
fn shared_stems(names: &[String]) -> Vec<(&str, &str)> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    let mut shared = Vec::new();
    for name in names {
        match seen.entry(file_stem(name)) {
            Entry::Occupied(first) => shared.push((*first.get(), name.as_str())),
            Entry::Vacant(slot) => {
                slot.insert(name);
            }
        }
    }
    shared
}

fn non_empty<T>(name: &str, buffer: Buffer2<T>) -> Result<Buffer2<T>, DecodeError> {
    if buffer.is_empty() {
        return Err(DecodeError::Invalid {
            name: name.to_string(),
            reason: "decoded to an empty buffer".to_string(),
        });
    }
    Ok(buffer)
}

fn write_variation<S: OutputSink + ?Sized>(
    sink: &mut S,
    base: &str,
    index: usize,
    variation: &Variation,
) -> Result<(), SinkError> {
    sink.write_image(
        OutputKind::Variation,
        &variation_name(base, index),
        &variation.image,
    )?;
    sink.write_mask(&variation_mask_name(base, index), &variation.mask)
}

fn report_summary(progress: &dyn Progress, stats: &RunStats) {
    if stats.cancelled {
        progress.report("Processing cancelled:");
    } else {
        progress.report("Processing complete:");
    }
    progress.report(&format!("  images found: {}", stats.total_images_found));
    progress.report(&format!("  images processed: {}", stats.images_processed));
    progress.report(&format!("  images with errors: {}", stats.images_with_errors));
    progress.report(&format!(
        "  variations created: {}",
        stats.total_variations_created
    ));
}
