use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bgcrop::{
    BatchReport, CropConfig, InferenceEngine, MaskSource, OutputFormat, ProcessingMode,
    ProcessingParams, Remover, Rgb, load_image, process_directory_to_path,
};
use image::{DynamicImage, Rgba, RgbaImage};
use ndarray::ArrayView4;
use tempfile::tempdir;

/// Emits strong foreground logits in the centre half of the frame and counts calls.
struct CentreSquareEngine {
    side: u32,
    calls: Arc<AtomicUsize>,
}

impl InferenceEngine for CentreSquareEngine {
    fn input_size(&self) -> u32 {
        self.side
    }

    fn infer(&mut self, input: ArrayView4<'_, f32>, output: &mut Vec<f32>) -> bgcrop::Result<()> {
        assert_eq!(input.dim(), (1, 3, self.side as usize, self.side as usize));
        self.calls.fetch_add(1, Ordering::SeqCst);
        let s = self.side;
        let inside = |v: u32| (s / 4..3 * s / 4).contains(&v);
        for y in 0..s {
            for x in 0..s {
                output.push(if inside(x) && inside(y) { 8.0 } else { -8.0 });
            }
        }
        Ok(())
    }
}

fn remover(side: u32) -> (Remover, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = CentreSquareEngine {
        side,
        calls: Arc::clone(&calls),
    };
    (Remover::new(Box::new(engine)), calls)
}

fn photo(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(w, h, |x, y| {
        Rgba([(x % 200) as u8 + 30, (y % 200) as u8 + 30, 90, 255])
    }))
}

#[test]
fn crop_surrounds_the_detected_square() {
    let (remover, calls) = remover(32);
    let config = CropConfig {
        margin: 10,
        ..CropConfig::default()
    };
    let out = remover.smart_crop(&photo(320, 320), &config).expect("crop");

    // Mask square spans [8, 23] at scale 10: [80, 230] plus 10 px margin each side.
    assert_eq!(out.dimensions(), (170, 170));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn square_crop_on_wide_image() {
    let (remover, _) = remover(32);
    let config = CropConfig {
        margin: 0,
        square_crop: true,
        ..CropConfig::default()
    };
    let out = remover.smart_crop(&photo(640, 320), &config).expect("crop");
    let (w, h) = out.dimensions();
    assert_eq!(w, h);
}

#[test]
fn cutout_background_is_white_and_subject_kept() {
    let (remover, _) = remover(32);
    let img = photo(128, 96);
    let out = remover.remove_background(&img).expect("cutout");

    assert_eq!(out.dimensions(), (128, 96));
    for &(x, y) in &[(0, 0), (127, 0), (0, 95), (127, 95)] {
        assert_eq!(out.get_pixel(x, y).0, [255, 255, 255, 255], "corner ({x}, {y})");
    }
    assert_eq!(out.get_pixel(64, 48).0, img.to_rgba8().get_pixel(64, 48).0);
}

#[test]
fn shared_remover_across_threads() {
    let (remover, calls) = remover(16);
    let img = photo(64, 64);
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let out = remover
                    .remove_background_over(&img, Rgb([0, 0, 0]))
                    .expect("cutout");
                assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
            });
        }
    });
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert!(remover.tensor_pool().available() >= 1);
}

#[test]
fn batch_with_model_writes_every_image() {
    let (remover, calls) = remover(32);
    let input = tempdir().expect("input dir");
    let output = tempdir().expect("output dir");
    for name in ["one.png", "two.png", "three.png"] {
        photo(100, 80).save(input.path().join(name)).expect("save input");
    }
    std::fs::create_dir(input.path().join("nested")).expect("nested dir");
    std::fs::write(input.path().join("notes.md"), "# not an image").expect("notes");

    let params = ProcessingParams {
        mode: ProcessingMode::Crop,
        mask_source: MaskSource::Model,
        format: OutputFormat::JPEG,
        ..ProcessingParams::default()
    };
    let report =
        process_directory_to_path(input.path(), output.path(), &params, Some(&remover), false)
            .expect("batch");

    assert_eq!(
        report,
        BatchReport {
            processed: 3,
            skipped: 1,
            errors: 0
        }
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let written = load_image(&output.path().join("two.jpg")).expect("read output");
    assert!(written.width() < 100 && written.height() < 80);
}
