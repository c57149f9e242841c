//! Generates samples from directories given in the environment.
//!
//! ```text
//! MIMIC_IMAGES=data/images MIMIC_MASKS=data/masks MIMIC_OUTPUT=out \
//!     cargo run --release -p mimic --example generate
//! ```
//!
//! `MIMIC_CONFIG` may point to a YAML config; `MIMIC_TIMEOUT_SECS` cancels the
//! run after that many seconds.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use mimic::io::{raster_to_rgb, validate_dirs, DirImages, DirMasks, DirSink};
use mimic::preview::{preview_grid, THUMB_SIZE};
use mimic::{CancelToken, Collection, Config, Generator};

fn env_path(key: &str) -> anyhow::Result<PathBuf> {
    std::env::var_os(key)
        .map(PathBuf::from)
        .with_context(|| format!("{key} is not set"))
}

fn main() -> anyhow::Result<()> {
    let image_dir = env_path("MIMIC_IMAGES")?;
    let mask_dir = env_path("MIMIC_MASKS")?;
    let output_dir = env_path("MIMIC_OUTPUT")?;

    common::log_setup::setup_logging("info", Some(&output_dir.join("logs")));

    let config = match std::env::var_os("MIMIC_CONFIG") {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    println!("Config:\n{}", config.to_yaml_string()?);

    let report = validate_dirs(&image_dir, &mask_dir, &output_dir);
    for warning in &report.warnings {
        println!("Warning: {warning}");
    }
    if !report.is_valid() {
        bail!("Invalid directories: {}", report.errors.join("; "));
    }
    println!(
        "{} images, {} masks",
        report.image_count, report.mask_count
    );

    let generator = Generator::new(config)?;
    let images = DirImages::open(&image_dir)?;
    let masks = DirMasks::open(&mask_dir)?;
    let mut sink = DirSink::new(&output_dir);

    let cancel = CancelToken::new();
    if let Some(secs) = std::env::var("MIMIC_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
    {
        let token = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            token.cancel();
        });
    }

    let print_line = |line: &str| println!("{line}");
    let stats = generator.run(&images, &masks, &mut sink, Some(&print_line), &cancel)?;

    let variations = DirImages::open(output_dir.join(DirSink::VARIATIONS_DIR))?;
    let samples: Vec<_> = variations
        .names()
        .iter()
        .take(9)
        .filter_map(|name| variations.load(name).ok())
        .collect();
    let (thumb_w, thumb_h) = THUMB_SIZE;
    if let Some(rgb) = preview_grid(&samples, 3, 3, thumb_w, thumb_h).and_then(|g| raster_to_rgb(&g)) {
        let path = output_dir.join("preview.png");
        rgb.save(&path)?;
        println!("Preview written to {}", path.display());
    }

    println!("{}", serde_yml::to_string(&stats)?);
    Ok(())
}
