mod common;

use common::*;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use tickerscan::loader::output_stems;
use tickerscan::preprocess::binarize::invert;
use tickerscan::preprocess::steps::DenoiseStep;

fn standard() -> Pipeline {
    build_standard_pipeline(Arc::new(ThresholdProfile::default()))
}

#[test]
fn dark_glyph_on_light_grey_takes_the_dark_branch() -> anyhow::Result<()> {
    let data = standard().run("light.png", Some(light_grey_with_dark_glyph()))?;

    assert_eq!(data.get_string("branch"), Some("dark_on_light"));
    assert_eq!(data.get_bool("enhanced"), Some(false));
    assert_eq!(data.get_int("contours_removed"), Some(0));

    let out = data.into_binary()?;
    assert_eq!(out.dimensions(), (100, 100));
    assert_eq!(distinct_values(&out).into_iter().collect::<Vec<_>>(), vec![0, 255]);

    // Glyph is foreground (dark), background is light
    assert!(rect_is(&out, (44, 34, 12, 32), 0));
    assert!(rect_is(&out, (0, 0, 10, 10), 255));
    assert_eq!(GlyphImage::new(out).contours().len(), 1);
    Ok(())
}

#[test]
fn green_glyph_on_light_grey_survives_cleanup() -> anyhow::Result<()> {
    let data = standard().run("green.png", Some(light_grey_with_green_glyph()))?;
    assert_eq!(data.get_string("branch"), Some("dark_on_light"));

    let out = data.into_binary()?;
    assert!(rect_is(&out, (44, 34, 12, 32), 0));
    assert!(rect_is(&out, (0, 0, 10, 10), 255));
    assert_eq!(GlyphImage::new(out).contours().len(), 1);
    Ok(())
}

#[test]
fn light_glyph_on_dark_takes_the_light_branch() -> anyhow::Result<()> {
    let data = standard().run("dark.png", Some(dark_with_light_glyph()))?;
    assert_eq!(data.get_string("branch"), Some("light_on_dark"));

    let out = data.into_binary()?;
    assert_eq!(distinct_values(&out).len(), 2);
    // Polarity is corrected so the glyph ends up dark
    assert!(rect_is(&out, (44, 34, 12, 32), 0));
    assert!(rect_is(&out, (0, 0, 10, 10), 255));
    Ok(())
}

#[test]
fn flat_near_black_image_is_enhanced_before_grayscale() -> anyhow::Result<()> {
    let pipeline = standard();

    let normalized = pipeline.run_partial("flat.png", Some(flat_near_black()), 1)?;
    assert_eq!(normalized.stats.white_pixel_pct, 0.0);
    assert!(normalized.stats.light_grey_pixel_pct < 0.30);
    assert_eq!(normalized.get_bool("enhanced"), Some(true));
    assert!(matches!(normalized.frame, Frame::Gray(_)));

    let out = pipeline.run("flat.png", Some(flat_near_black()))?.into_binary()?;
    assert!(distinct_values(&out).is_subset(&[0u8, 255].into_iter().collect()));
    Ok(())
}

#[test]
fn images_with_bright_pixels_are_not_enhanced() -> anyhow::Result<()> {
    let normalized = standard().run_partial("dark.png", Some(dark_with_light_glyph()), 1)?;
    assert_eq!(normalized.get_bool("enhanced"), Some(false));
    Ok(())
}

#[test]
fn missing_image_is_rejected_before_any_step() {
    let err = standard().run("missing.mp4", None).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PreprocessError>(),
        Some(PreprocessError::InvalidImage(_))
    ));
}

#[test]
fn zero_sized_image_is_rejected() {
    let err = standard()
        .run("empty.png", Some(DynamicImage::new_luma8(0, 0)))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PreprocessError>(),
        Some(PreprocessError::InvalidImage(_))
    ));
}

#[test]
fn steps_reject_frames_from_the_wrong_stage() {
    let pipeline = Pipeline::new(Arc::new(ThresholdProfile::default())).add_step(Arc::new(DenoiseStep));
    let err = pipeline.run("color.png", Some(dark_with_light_glyph())).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PreprocessError>(),
        Some(PreprocessError::UnexpectedFrame { step: "denoise", .. })
    ));
}

#[test]
fn repeated_runs_are_byte_identical() -> anyhow::Result<()> {
    let pipeline = build_standard_pipeline(Arc::new(ThresholdProfile::centered()));
    let first = pipeline.run("noisy.png", Some(noisy_overlay()))?.into_binary()?;
    let second = pipeline.run("noisy.png", Some(noisy_overlay()))?.into_binary()?;
    assert_eq!(first.as_raw(), second.as_raw());
    Ok(())
}

#[test]
fn every_stage_keeps_the_input_dimensions() -> anyhow::Result<()> {
    let pipeline = build_standard_pipeline(Arc::new(ThresholdProfile::centered()));
    let input = noisy_overlay();
    for steps in 0..=pipeline.step_names().len() {
        let data = pipeline.run_partial("noisy.png", Some(input.clone()), steps)?;
        assert_eq!(data.frame.dimensions(), (120, 100), "after {} steps", steps);
    }
    Ok(())
}

#[test]
fn binarized_frame_has_two_values() -> anyhow::Result<()> {
    for input in [light_grey_with_dark_glyph(), dark_with_light_glyph()] {
        let data = standard().run_partial("glyph.png", Some(input), 2)?;
        let Frame::Binary(glyphs) = &data.frame else {
            panic!("expected a binary frame, got {}", data.frame.kind());
        };
        assert_eq!(distinct_values(glyphs.pixels()).len(), 2);
    }
    Ok(())
}

#[test]
fn inversion_is_self_inverse() -> anyhow::Result<()> {
    let out = standard().run("light.png", Some(light_grey_with_dark_glyph()))?.into_binary()?;
    assert_eq!(invert(invert(out.clone())), out);
    Ok(())
}

#[test]
fn realignment_is_only_in_the_centered_profile() {
    let default_steps = standard().step_names().len();
    let centered = build_standard_pipeline(Arc::new(ThresholdProfile::centered()));
    assert_eq!(default_steps, 3);
    assert_eq!(centered.step_names().last(), Some(&"Contour Realign"));
}

#[test]
fn debug_mode_writes_every_stage() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let pipeline = standard().with_debug(dir.path().to_path_buf())?;
    pipeline.run("light.png", Some(light_grey_with_dark_glyph()))?;

    for stage in [
        "00_input",
        "01_contrast_normalization",
        "02_polarity_binarization",
        "03_contour_denoise",
    ] {
        assert!(dir.path().join(stage).join("light.png").exists(), "missing {}", stage);
    }
    Ok(())
}

#[test]
fn inputs_sharing_a_stem_get_separate_debug_dumps() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let pipeline = standard().with_debug(dir.path().to_path_buf())?;

    let inputs = [PathBuf::from("a/x.png"), PathBuf::from("b/x.jpg")];
    let stems = output_stems(&inputs);
    assert_eq!(stems, vec!["x", "x_2"]);

    pipeline.run(&format!("{}.png", stems[0]), Some(light_grey_with_dark_glyph()))?;
    pipeline.run(&format!("{}.png", stems[1]), Some(dark_with_light_glyph()))?;

    let stage = dir.path().join("03_contour_denoise");
    assert!(stage.join("x.png").exists());
    assert!(stage.join("x_2.png").exists());
    Ok(())
}

#[test]
fn debug_directory_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;
    assert!(standard().with_debug(dir.path().to_path_buf()).is_err());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_runs_are_isolated() -> anyhow::Result<()> {
    let pipeline = Arc::new(build_standard_pipeline(Arc::new(ThresholdProfile::centered())));
    let expected = pipeline.run("noisy.png", Some(noisy_overlay()))?.into_binary()?;

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            tokio::task::spawn_blocking(move || {
                // Every other run fails; the rest must be unaffected
                let input = if i % 2 == 0 { Some(noisy_overlay()) } else { None };
                pipeline.run("noisy.png", input)
            })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let result = task.await?;
        if i % 2 == 0 {
            assert_eq!(result?.into_binary()?.as_raw(), expected.as_raw());
        } else {
            assert!(result.is_err());
        }
    }
    Ok(())
}
