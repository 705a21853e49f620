//! Validates pattern extraction and overlapping-model rule construction

use wavetiler::model::Model;
use wavetiler::model::overlapping::OverlappingModel;
use wavetiler::model::pattern::{PalettedImage, extract_patterns};
use wavetiler::solver::Output;

fn checkerboard() -> PalettedImage {
    PalettedImage {
        width: 2,
        height: 2,
        data: vec![0, 1, 1, 0],
        palette: vec![[0, 0, 0, 255], [255, 255, 255, 255]],
    }
}

#[test]
fn test_extraction_counts_window_prevalence() {
    let sample = checkerboard();
    let extracted = extract_patterns(&sample, 2, true, 1, false).unwrap();

    // The two checkerboard phases, each seen at two window positions
    assert_eq!(extracted.prevalence.len(), 2);
    assert_eq!(extracted.prevalence.values().sum::<usize>(), 4);
    assert!(extracted.foundation.is_none());
}

#[test]
fn test_symmetry_multiplies_contributions() {
    let sample = checkerboard();
    let extracted = extract_patterns(&sample, 2, true, 8, false).unwrap();

    // Every transform of a checkerboard phase is again a phase, so the
    // distinct set stays the same while counts scale with the transforms
    assert_eq!(extracted.prevalence.len(), 2);
    assert_eq!(extracted.prevalence.values().sum::<usize>(), 32);
}

#[test]
fn test_nonperiodic_sampling_shrinks_window_count() {
    let sample = PalettedImage {
        width: 4,
        height: 3,
        data: vec![0, 1, 0, 1, 1, 0, 1, 0, 0, 1, 0, 1],
        palette: vec![[0, 0, 0, 255], [255, 255, 255, 255]],
    };

    let wrapped = extract_patterns(&sample, 2, true, 1, false).unwrap();
    let clipped = extract_patterns(&sample, 2, false, 1, false).unwrap();

    assert_eq!(wrapped.prevalence.values().sum::<usize>(), 12);
    assert_eq!(clipped.prevalence.values().sum::<usize>(), 6);
}

#[test]
fn test_extraction_rejects_oversized_window() {
    let sample = checkerboard();
    assert!(extract_patterns(&sample, 3, false, 1, false).is_err());
    assert!(extract_patterns(&sample, 3, true, 1, false).is_err());
}

#[test]
fn test_extraction_rejects_bad_symmetry() {
    let sample = checkerboard();
    assert!(extract_patterns(&sample, 2, true, 0, false).is_err());
    assert!(extract_patterns(&sample, 2, true, 9, false).is_err());
}

fn build_checkerboard_model(periodic_out: bool) -> OverlappingModel {
    let sample = checkerboard();
    let extracted = extract_patterns(&sample, 2, true, 1, false).unwrap();
    OverlappingModel::new(
        &extracted.prevalence,
        sample.palette,
        2,
        periodic_out,
        6,
        6,
        None,
    )
    .unwrap()
}

#[test]
fn test_model_weights_preserve_prevalence_mass() {
    let model = build_checkerboard_model(true);
    let total: f64 = (0..model.num_patterns())
        .map(|t| model.pattern_weight(t))
        .sum();
    assert!((total - 4.0).abs() < f64::EPSILON);
}

#[test]
fn test_supporter_relation_is_symmetric() {
    let model = build_checkerboard_model(true);
    let num = model.num_patterns();

    for t1 in 0..num {
        for t2 in 0..num {
            for dx in -1..=1isize {
                for dy in -1..=1isize {
                    let forward = model
                        .supporters(t1, dx, dy)
                        .contains(&(t2 as u16));
                    let backward = model
                        .supporters(t2, -dx, -dy)
                        .contains(&(t1 as u16));
                    assert_eq!(
                        forward, backward,
                        "t1={t1} t2={t2} offset=({dx}, {dy})"
                    );
                }
            }
        }
    }
}

#[test]
fn test_every_pattern_supports_itself_at_origin() {
    let model = build_checkerboard_model(true);
    for t in 0..model.num_patterns() {
        assert!(model.supporters(t, 0, 0).contains(&(t as u16)));
    }
}

#[test]
fn test_supporters_outside_kernel_are_empty() {
    let model = build_checkerboard_model(true);
    assert!(model.supporters(0, 2, 0).is_empty());
    assert!(model.supporters(0, 0, -2).is_empty());
}

#[test]
fn test_boundary_tracks_window_overrun() {
    let clipped = build_checkerboard_model(false);
    assert!(!clipped.on_boundary(0, 0));
    assert!(!clipped.on_boundary(4, 4));
    assert!(clipped.on_boundary(5, 0));
    assert!(clipped.on_boundary(0, 5));

    let wrapped = build_checkerboard_model(true);
    assert!(!wrapped.on_boundary(5, 5));
}

#[test]
fn test_undecided_cells_render_blended() {
    let model = build_checkerboard_model(true);
    let output = Output::new(model.width(), model.height(), model.num_patterns());
    let image = model.image(&output);

    // With both phases open every pixel sees black and white contributors
    // in equal measure, so the blend is mid-gray
    let pixel = image.get_pixel(2, 2);
    assert_eq!(pixel.0[0], 127);
    assert_eq!(pixel.0[3], 255);
}

#[test]
fn test_model_rejects_degenerate_inputs() {
    let sample = checkerboard();
    let extracted = extract_patterns(&sample, 2, true, 1, false).unwrap();

    assert!(
        OverlappingModel::new(
            &extracted.prevalence,
            sample.palette.clone(),
            2,
            true,
            0,
            6,
            None
        )
        .is_err()
    );

    let empty = wavetiler::model::pattern::PatternPrevalence::new();
    assert!(OverlappingModel::new(&empty, sample.palette, 2, true, 6, 6, None).is_err());
}
