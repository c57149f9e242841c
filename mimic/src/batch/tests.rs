//! Tests for batch orchestration.

use super::*;
use crate::io::{MemoryCollection, MemorySink};
use crate::testing::{gradient_image, mask_with_rects};
use crate::types::{Rect, RotationRange};

const W: usize = 48;
const H: usize = 36;

fn config() -> Config {
    Config {
        canvas_width: W,
        canvas_height: H,
        num_backgrounds: 5,
        variations_per_background: 2,
        rotation_range: RotationRange::new(-30.0, 30.0),
        foreground_classes: vec![1, 2],
        max_patch_attempts: 500,
        max_parallel_variations: 2,
        seed: Some(17),
    }
}

fn scene_mask() -> ClassMask {
    mask_with_rects(
        W,
        H,
        &[(Rect::new(6, 5, 9, 7), 1), (Rect::new(8, 7, 3, 2), 2)],
    )
}

/// Image and mask collections holding one valid scene per name.
fn scenes(names: &[&str]) -> (MemoryCollection<RasterImage>, MemoryCollection<ClassMask>) {
    let mut images = MemoryCollection::new();
    let mut masks = MemoryCollection::new();
    for name in names {
        images.insert(*name, gradient_image(W, H));
        masks.insert(*name, scene_mask());
    }
    (images, masks)
}

fn run(
    config: Config,
    images: &impl Collection<Item = RasterImage>,
    masks: &impl Collection<Item = ClassMask>,
    sink: &mut MemorySink,
) -> (RunStats, ProgressLog) {
    let log = ProgressLog::new();
    let stats = Generator::new(config)
        .unwrap()
        .run(images, masks, sink, Some(&log), &CancelToken::new())
        .unwrap();
    (stats, log)
}

/// Lists names in reverse order to show the batch sorts them itself.
struct Reversed(MemoryCollection<RasterImage>);

impl Collection for Reversed {
    type Item = RasterImage;

    fn names(&self) -> Vec<String> {
        let mut names = self.0.names();
        names.reverse();
        names
    }

    fn load(&self, name: &str) -> std::result::Result<RasterImage, crate::error::DecodeError> {
        self.0.load(name)
    }
}

/// Cancels a token once a named image has been written.
struct CancelAfter {
    inner: MemorySink,
    trigger: String,
    token: CancelToken,
}

impl OutputSink for CancelAfter {
    fn write_image(
        &mut self,
        kind: OutputKind,
        name: &str,
        image: &RasterImage,
    ) -> std::result::Result<(), SinkError> {
        if name == self.trigger {
            self.token.cancel();
        }
        self.inner.write_image(kind, name, image)
    }

    fn write_mask(&mut self, name: &str, mask: &ClassMask) -> std::result::Result<(), SinkError> {
        self.inner.write_mask(name, mask)
    }
}

#[test]
fn test_missing_mask_is_isolated() {
    let (images, mut masks) = scenes(&["a.png", "c.png"]);
    let mut images = images;
    images.insert("b.png", gradient_image(W, H));
    masks.insert("unrelated.png", scene_mask());
    let mut sink = MemorySink::new();

    let (stats, log) = run(
        Config {
            num_backgrounds: 3,
            ..config()
        },
        &images,
        &masks,
        &mut sink,
    );

    assert_eq!(stats.total_images_found, 3);
    assert_eq!(stats.images_processed, 2);
    assert_eq!(stats.images_with_errors, 1);
    assert_eq!(stats.total_variations_created, 4);
    assert!(!stats.cancelled);
    assert_eq!(sink.count(OutputKind::Background), 2);
    assert_eq!(sink.count(OutputKind::Variation), 4);
    assert_eq!(sink.masks.len(), 6, "2 background masks + 4 variation masks");
    assert!(log.contains("[2/3] b.png: error: No mask found for 'b.png'"));
}

#[test]
fn test_selects_lexicographically_smallest_names() {
    let (images, masks) = scenes(&["e.png", "b.png", "d.png", "a.png", "c.png"]);
    let mut sink = MemorySink::new();

    let (stats, _) = run(
        Config {
            num_backgrounds: 2,
            variations_per_background: 1,
            ..config()
        },
        &Reversed(images),
        &masks,
        &mut sink,
    );

    assert_eq!(stats.total_images_found, 5);
    assert_eq!(stats.images_processed, 2);
    let backgrounds: Vec<&str> = sink
        .images
        .iter()
        .filter(|s| s.kind == OutputKind::Background)
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(backgrounds, vec!["background_a", "background_b"]);
}

#[test]
fn test_pairing_ignores_extension_but_not_case() {
    let mut images = MemoryCollection::new();
    images
        .insert("scene.jpg", gradient_image(W, H))
        .insert("Other.png", gradient_image(W, H));
    let mut masks = MemoryCollection::new();
    masks
        .insert("scene.png", scene_mask())
        .insert("other.png", scene_mask());
    let mut sink = MemorySink::new();

    let (stats, log) = run(config(), &images, &masks, &mut sink);

    assert_eq!(stats.images_processed, 1);
    assert_eq!(stats.images_with_errors, 1);
    assert!(sink.image("background_scene").is_some());
    assert!(log.contains("No mask found for 'Other.png'"));
}

#[test]
fn test_output_names_and_masks() {
    let (images, masks) = scenes(&["rat_01.png"]);
    let mut sink = MemorySink::new();

    run(config(), &images, &masks, &mut sink);

    let names: Vec<&str> = sink.images.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["background_rat_01", "rat_01_var1", "rat_01_var2"]);
    let mask_names: Vec<&str> = sink.masks.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        mask_names,
        vec!["background_mask_rat_01", "rat_01_var1_mask", "rat_01_var2_mask"]
    );

    let background_mask = sink.mask("background_mask_rat_01").unwrap();
    assert_eq!(background_mask.dimensions(), (W, H));
    assert!(background_mask.iter().all(|&c| c == 0));

    for name in ["rat_01_var1_mask", "rat_01_var2_mask"] {
        let mask = sink.mask(name).unwrap();
        assert!(mask.iter().any(|&c| c != 0), "{name} has no object");
        assert!(
            mask.iter().all(|&c| c == 0 || c == 1 || c == 2),
            "{name} carries a class that was never in the object"
        );
    }
}

#[test]
fn test_inputs_are_resized_to_canvas() {
    let mut images = MemoryCollection::new();
    images.insert("big.png", gradient_image(W * 2, H * 2));
    let mut masks = MemoryCollection::new();
    masks.insert(
        "big.png",
        mask_with_rects(W * 2, H * 2, &[(Rect::new(10, 10, 16, 12), 1)]),
    );
    let mut sink = MemorySink::new();

    let (stats, _) = run(config(), &images, &masks, &mut sink);

    assert_eq!(stats.images_processed, 1);
    for stored in &sink.images {
        assert_eq!(stored.image.dimensions(), (W, H), "{}", stored.name);
    }
    for stored in &sink.masks {
        assert_eq!(stored.mask.dimensions(), (W, H), "{}", stored.name);
    }
}

#[test]
fn test_decode_failure_is_counted() {
    let (images, mut masks) = scenes(&["a.png", "b.png"]);
    masks.insert_corrupt("a.png", "truncated file");
    let mut sink = MemorySink::new();

    let (stats, log) = run(config(), &images, &masks, &mut sink);

    assert_eq!(stats.images_processed, 1);
    assert_eq!(stats.images_with_errors, 1);
    assert!(log.contains("truncated file"));
}

#[test]
fn test_mask_without_object_is_counted() {
    let (images, mut masks) = scenes(&["a.png"]);
    masks.insert("a.png", mask_with_rects(W, H, &[(Rect::new(0, 0, 5, 5), 9)]));
    let mut sink = MemorySink::new();

    let (stats, log) = run(config(), &images, &masks, &mut sink);

    assert_eq!(stats.images_processed, 0);
    assert_eq!(stats.images_with_errors, 1);
    assert!(log.contains("No object found"));
    assert!(sink.images.is_empty());
}

#[test]
fn test_patch_search_exhaustion_is_counted() {
    let (images, mut masks) = scenes(&["a.png"]);
    // every pixel outside the object belongs to another class
    masks.insert(
        "a.png",
        mask_with_rects(
            W,
            H,
            &[(Rect::new(0, 0, W, H), 7), (Rect::new(10, 10, 20, 10), 1)],
        ),
    );
    let mut sink = MemorySink::new();

    let (stats, log) = run(
        Config {
            max_patch_attempts: 50,
            ..config()
        },
        &images,
        &masks,
        &mut sink,
    );

    assert_eq!(stats.images_with_errors, 1);
    assert!(log.contains("background patch found in 50 attempts"));
    assert!(sink.images.is_empty());
}

#[test]
fn test_background_write_failure_fails_image() {
    let (images, masks) = scenes(&["a.png", "b.png"]);
    let mut sink = MemorySink::new();
    sink.reject("background_a");

    let (stats, _) = run(config(), &images, &masks, &mut sink);

    assert_eq!(stats.images_processed, 1);
    assert_eq!(stats.images_with_errors, 1);
    assert_eq!(stats.total_variations_created, 2);
}

#[test]
fn test_variation_write_failure_is_skipped() {
    let (images, masks) = scenes(&["a.png"]);
    let mut sink = MemorySink::new();
    sink.reject("a_var2_mask");

    let (stats, log) = run(
        Config {
            variations_per_background: 3,
            ..config()
        },
        &images,
        &masks,
        &mut sink,
    );

    assert_eq!(stats.images_processed, 1);
    assert_eq!(stats.images_with_errors, 0);
    assert_eq!(stats.total_variations_created, 2);
    assert!(log.contains("variation 2 failed"));
    assert!(sink.image("a_var3").is_some());
}

#[test]
fn test_num_backgrounds_larger_than_collection() {
    let (images, masks) = scenes(&["a.png"]);
    let mut sink = MemorySink::new();

    let (stats, _) = run(
        Config {
            num_backgrounds: 10,
            ..config()
        },
        &images,
        &masks,
        &mut sink,
    );

    assert_eq!(stats.total_images_found, 1);
    assert_eq!(stats.images_processed, 1);
}

#[test]
fn test_cancelled_before_start() {
    let (images, masks) = scenes(&["a.png", "b.png"]);
    let mut sink = MemorySink::new();
    let cancel = CancelToken::new();
    cancel.cancel();

    let stats = Generator::new(config())
        .unwrap()
        .run(&images, &masks, &mut sink, None, &cancel)
        .unwrap();

    assert!(stats.cancelled);
    assert_eq!(stats.total_images_found, 2);
    assert_eq!(stats.images_processed, 0);
    assert!(sink.images.is_empty());
}

#[test]
fn test_cancel_between_images() {
    let (images, masks) = scenes(&["a.png", "b.png", "c.png"]);
    let mut sink = MemorySink::new();
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let progress = move |line: &str| {
        if line.contains("done") {
            token.cancel();
        }
    };

    let stats = Generator::new(config())
        .unwrap()
        .run(&images, &masks, &mut sink, Some(&progress), &cancel)
        .unwrap();

    assert!(stats.cancelled);
    assert_eq!(stats.images_processed, 1);
    assert_eq!(sink.count(OutputKind::Background), 1);
}

#[test]
fn test_cancel_between_variation_chunks() {
    let (images, masks) = scenes(&["a.png", "b.png"]);
    let cancel = CancelToken::new();
    let mut sink = CancelAfter {
        inner: MemorySink::new(),
        trigger: "a_var2".to_string(),
        token: cancel.clone(),
    };

    let stats = Generator::new(Config {
        variations_per_background: 6,
        max_parallel_variations: 2,
        ..config()
    })
    .unwrap()
    .run(&images, &masks, &mut sink, None, &cancel)
    .unwrap();

    assert!(stats.cancelled);
    assert_eq!(stats.images_processed, 1);
    assert_eq!(stats.total_variations_created, 2);
    assert!(sink.inner.image("background_b").is_none());
}

#[test]
fn test_same_seed_same_output() {
    let (images, masks) = scenes(&["a.png", "b.png"]);
    let cfg = Config {
        max_parallel_variations: 3,
        variations_per_background: 5,
        ..config()
    };

    let mut first = MemorySink::new();
    let mut second = MemorySink::new();
    run(cfg.clone(), &images, &masks, &mut first);
    run(cfg, &images, &masks, &mut second);

    assert_eq!(first.images.len(), second.images.len());
    for (a, b) in first.images.iter().zip(&second.images) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.image, b.image, "{} differs between runs", a.name);
    }
    for (a, b) in first.masks.iter().zip(&second.masks) {
        assert_eq!(a.mask, b.mask, "{} differs between runs", a.name);
    }
}

#[test]
fn test_parallelism_does_not_change_output() {
    let (images, masks) = scenes(&["a.png"]);
    let mut serial = MemorySink::new();
    let mut parallel = MemorySink::new();

    run(
        Config {
            max_parallel_variations: 1,
            variations_per_background: 4,
            ..config()
        },
        &images,
        &masks,
        &mut serial,
    );
    run(
        Config {
            max_parallel_variations: 4,
            variations_per_background: 4,
            ..config()
        },
        &images,
        &masks,
        &mut parallel,
    );

    for (a, b) in serial.images.iter().zip(&parallel.images) {
        assert_eq!(a.image, b.image, "{} differs", a.name);
    }
}

#[test]
fn test_progress_lines_in_order() {
    let (images, masks) = scenes(&["a.png"]);
    let mut sink = MemorySink::new();

    let (_, log) = run(config(), &images, &masks, &mut sink);
    let lines = log.take();

    assert_eq!(lines[0], "Found 1 images to process");
    assert_eq!(lines[1], "[1/1] a.png: processing");
    assert_eq!(lines[2], "[1/1] a.png: object bbox x=6, y=5, w=9, h=7");
    assert_eq!(lines[3], "[1/1] a.png: done, 2 variations created");
    assert_eq!(lines[4], "Processing complete:");
    assert!(lines.last().unwrap().ends_with("variations created: 2"));
    assert!(log.lines().is_empty(), "take drains the log");
}

#[test]
fn test_failing_image_is_announced_before_its_error() {
    let (mut images, masks) = scenes(&["a.png"]);
    images.insert("b.png", gradient_image(W, H));
    let mut sink = MemorySink::new();

    let (_, log) = run(config(), &images, &masks, &mut sink);
    let lines = log.lines();

    let position = |line: &str| lines.iter().position(|l| l == line);
    let start = position("[2/2] b.png: processing").expect("no start line for b.png");
    let error = position("[2/2] b.png: error: No mask found for 'b.png'")
        .expect("no error line for b.png");
    assert!(start < error);
    assert!(position("[1/2] a.png: processing").is_some_and(|a| a < start));
}

#[test]
fn test_shared_base_name_is_reported() {
    let (images, masks) = scenes(&["a.jpg", "a.png", "b.png"]);
    let mut sink = MemorySink::new();

    let (stats, log) = run(config(), &images, &masks, &mut sink);

    assert_eq!(stats.images_processed, 3);
    assert!(log.contains("Warning: a.jpg and a.png share the base name 'a'"));
    assert!(!log.contains("b.png share"));
    assert!(shared_stems(&["x.png".to_string(), "y.png".to_string()]).is_empty());
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = Generator::new(Config {
        foreground_classes: vec![],
        ..config()
    });
    assert!(matches!(result, Err(ConfigError::EmptyForeground)));
}

#[test]
fn test_unpreparable_sink_aborts() {
    let (images, masks) = scenes(&["a.png"]);
    let mut sink = MemorySink::new();
    sink.fail_prepare();

    let result = Generator::new(config()).unwrap().run(
        &images,
        &masks,
        &mut sink,
        None,
        &CancelToken::new(),
    );

    assert!(matches!(result, Err(Error::Output(_))));
    assert!(sink.images.is_empty());
}

#[test]
fn test_run_stats_serialize() {
    let stats = RunStats {
        total_images_found: 3,
        images_processed: 2,
        images_with_errors: 1,
        total_variations_created: 20,
        cancelled: false,
    };
    let yaml = serde_yml::to_string(&stats).unwrap();
    assert!(yaml.contains("images_with_errors: 1"));
    assert_eq!(serde_yml::from_str::<RunStats>(&yaml).unwrap(), stats);
}

#[test]
fn test_empty_decode_is_counted() {
    let (mut images, masks) = scenes(&["a.png", "b.png"]);
    images.insert("a.png", RasterImage::new_default(0, 0));
    let mut sink = MemorySink::new();

    let (stats, log) = run(config(), &images, &masks, &mut sink);

    assert_eq!(stats.images_processed, 1);
    assert_eq!(stats.images_with_errors, 1);
    assert!(log.contains("empty buffer"));
}
