//! Exercises the observe/propagate loop end to end on small exemplars

use image::RgbaImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use wavetiler::model::Model;
use wavetiler::model::overlapping::OverlappingModel;
use wavetiler::model::pattern::{PalettedImage, extract_patterns};
use wavetiler::solver::run::scroll_diagonally;
use wavetiler::solver::{CellChoice, FrameSink, RunStatus, create_output, find_lowest_entropy, run};

/// Sink recording the dimensions and delay of every frame it receives
#[derive(Default)]
struct FrameLog {
    frames: Vec<(u32, u32, u32)>,
}

impl FrameSink for FrameLog {
    fn push_frame(&mut self, image: &RgbaImage, delay_ms: u32) -> wavetiler::Result<()> {
        self.frames.push((image.width(), image.height(), delay_ms));
        Ok(())
    }
}

/// 2x2 checkerboard exemplar with two colors
fn checkerboard() -> PalettedImage {
    PalettedImage {
        width: 2,
        height: 2,
        data: vec![0, 1, 1, 0],
        palette: vec![[0, 0, 0, 255], [255, 255, 255, 255]],
    }
}

fn checkerboard_model_with(width: usize, height: usize, periodic_out: bool) -> OverlappingModel {
    let sample = checkerboard();
    let extracted = extract_patterns(&sample, 2, true, 1, false).unwrap();
    OverlappingModel::new(
        &extracted.prevalence,
        sample.palette,
        2,
        periodic_out,
        width,
        height,
        None,
    )
    .unwrap()
}

fn checkerboard_model(width: usize, height: usize) -> OverlappingModel {
    checkerboard_model_with(width, height, true)
}

#[test]
fn test_uniform_exemplar_succeeds_immediately() {
    let sample = PalettedImage {
        width: 2,
        height: 2,
        data: vec![0; 4],
        palette: vec![[10, 20, 30, 255]],
    };
    let extracted = extract_patterns(&sample, 1, true, 1, false).unwrap();
    assert_eq!(extracted.prevalence.len(), 1);
    assert_eq!(extracted.prevalence.values().sum::<usize>(), 4);

    let model =
        OverlappingModel::new(&extracted.prevalence, sample.palette, 1, true, 4, 4, None).unwrap();

    let mut output = create_output(&model);
    let report = run(&model, &mut output, 7, 0, None).unwrap();

    // Every cell is trivially frozen to the single pattern
    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.iterations, 0);

    let image = model.image(&output);
    assert_eq!(image.dimensions(), (4, 4));
    for pixel in image.pixels() {
        assert_eq!(pixel.0, [10, 20, 30, 255]);
    }
}

#[test]
fn test_entropy_scan_covers_all_terminal_cases() {
    let model = checkerboard_model(4, 4);
    let mut rng = StdRng::seed_from_u64(1);

    // Fresh state: undecided cells exist, so the scan names a candidate
    let mut output = create_output(&model);
    assert!(matches!(
        find_lowest_entropy(&model, &output, &mut rng),
        CellChoice::Cell { .. }
    ));

    // All frozen: the scan reports completion
    run(&model, &mut output, 8, 0, None).unwrap();
    assert_eq!(
        find_lowest_entropy(&model, &output, &mut rng),
        CellChoice::Finished
    );

    // An emptied cell is a contradiction
    for t in 0..model.num_patterns() {
        output.wave.ban(1, 1, t);
    }
    assert_eq!(
        find_lowest_entropy(&model, &output, &mut rng),
        CellChoice::Contradiction
    );
}

#[test]
fn test_checkerboard_collapses_completely() {
    let model = checkerboard_model(6, 6);
    let mut output = create_output(&model);
    let report = run(&model, &mut output, 99, 0, None).unwrap();

    assert_eq!(report.status, RunStatus::Success);
    for x in 0..6 {
        for y in 0..6 {
            assert_eq!(output.wave.count_possible(x, y), 1, "cell ({x}, {y})");
            assert!(output.wave.frozen_pattern(x, y).is_some());
        }
    }
}

#[test]
fn test_success_renders_alternating_pixels() {
    let model = checkerboard_model(4, 4);
    let mut output = create_output(&model);
    let report = run(&model, &mut output, 5, 0, None).unwrap();
    assert_eq!(report.status, RunStatus::Success);

    let image = model.image(&output);
    assert_eq!(image.dimensions(), (4, 4));
    for y in 0..4u32 {
        for x in 0..3u32 {
            assert_ne!(
                image.get_pixel(x, y),
                image.get_pixel(x + 1, y),
                "horizontal neighbors at ({x}, {y}) must alternate"
            );
        }
    }
}

#[test]
fn test_same_seed_reproduces_output() {
    // Even dimensions, so the periodic checkerboard is satisfiable
    let model = checkerboard_model(6, 6);

    let mut first = create_output(&model);
    run(&model, &mut first, 1234, 0, None).unwrap();
    let mut second = create_output(&model);
    run(&model, &mut second, 1234, 0, None).unwrap();

    assert_eq!(
        model.image(&first).into_raw(),
        model.image(&second).into_raw()
    );
}

#[test]
fn test_periodic_solve_emits_frames_with_scroll_coda() {
    // One collapse fully determines a checkerboard, so the attempt
    // succeeds on its second iteration regardless of seed
    let model = checkerboard_model(4, 4);
    let mut output = create_output(&model);
    let mut sink = FrameLog::default();

    let report = run(&model, &mut output, 17, 0, Some(&mut sink)).unwrap();
    assert_eq!(report.status, RunStatus::Success);

    // One in-progress frame, the long end pause, then one scroll frame
    // per output column
    assert_eq!(sink.frames.len(), 2 + 4);
    assert_eq!(sink.frames[0], (4, 4, 10));
    assert_eq!(sink.frames[1], (4, 4, 2000));
    for frame in &sink.frames[2..] {
        assert_eq!(*frame, (4, 4, 10));
    }
}

#[test]
fn test_nonperiodic_solve_skips_the_coda() {
    let model = checkerboard_model_with(4, 4, false);
    let mut output = create_output(&model);
    let mut sink = FrameLog::default();

    let report = run(&model, &mut output, 17, 0, Some(&mut sink)).unwrap();
    assert_eq!(report.status, RunStatus::Success);

    let delays: Vec<u32> = sink.frames.iter().map(|&(_, _, d)| d).collect();
    assert_eq!(delays, vec![10, 2000]);
}

#[test]
fn test_diagonal_scroll_wraps_both_axes() {
    let mut img = RgbaImage::new(2, 2);
    img.put_pixel(0, 0, image::Rgba([1, 0, 0, 255]));
    img.put_pixel(1, 0, image::Rgba([2, 0, 0, 255]));
    img.put_pixel(0, 1, image::Rgba([3, 0, 0, 255]));
    img.put_pixel(1, 1, image::Rgba([4, 0, 0, 255]));

    let scrolled = scroll_diagonally(&img);
    assert_eq!(scrolled.get_pixel(0, 0).0[0], 4);
    assert_eq!(scrolled.get_pixel(1, 0).0[0], 3);
    assert_eq!(scrolled.get_pixel(0, 1).0[0], 2);
    assert_eq!(scrolled.get_pixel(1, 1).0[0], 1);
}

#[test]
fn test_unsatisfiable_grid_reports_contradiction() {
    // A two-phase checkerboard cannot wrap an odd-sized torus, so the
    // first collapse forces an empty cell somewhere along the cycle
    let model = checkerboard_model(5, 5);
    let mut output = create_output(&model);
    let report = run(&model, &mut output, 11, 0, None).unwrap();

    assert_eq!(report.status, RunStatus::Fail);
    assert!(report.iterations >= 1);
}

#[test]
fn test_iteration_limit_reports_unfinished() {
    let model = checkerboard_model(8, 8);
    let mut output = create_output(&model);
    let report = run(&model, &mut output, 42, 1, None).unwrap();

    assert_eq!(report.status, RunStatus::Unfinished);
    assert_eq!(report.iterations, 1);
}

#[test]
fn test_propagation_reaches_fixed_point() {
    let model = checkerboard_model(4, 4);
    let mut output = create_output(&model);
    run(&model, &mut output, 3, 0, None).unwrap();

    // A finished attempt leaves nothing more to remove
    assert!(!model.propagate(&mut output));
}

#[test]
fn test_possibilities_never_return() {
    let model = checkerboard_model(4, 4);
    let mut output = create_output(&model);

    // Ban one pattern by hand, then drive propagation; the banned slot
    // must stay banned through every subsequent pass
    output.wave.ban(1, 1, 0);
    output.changes.set(1, 1);
    while model.propagate(&mut output) {}

    assert!(!output.wave.get(1, 1, 0));
}

#[test]
fn test_foundation_pins_bottom_row() {
    // Exemplar whose bottom row is a distinct color
    let sample = PalettedImage {
        width: 4,
        height: 4,
        data: vec![
            0, 0, 0, 0, //
            0, 0, 0, 0, //
            0, 0, 0, 0, //
            1, 1, 1, 1,
        ],
        palette: vec![[255, 255, 255, 255], [0, 0, 0, 255]],
    };
    let extracted = extract_patterns(&sample, 2, true, 1, true).unwrap();
    let foundation_hash = extracted.foundation.expect("foundation was requested");
    assert!(extracted.prevalence.contains_key(&foundation_hash));

    let model = OverlappingModel::new(
        &extracted.prevalence,
        sample.palette,
        2,
        true,
        5,
        5,
        Some(foundation_hash),
    )
    .unwrap();
    let foundation = model.foundation().expect("model records the pinned index");

    let output = create_output(&model);
    for x in 0..5 {
        assert_eq!(output.wave.frozen_pattern(x, 4), Some(foundation));
        for y in 0..4 {
            assert!(!output.wave.get(x, y, foundation), "cell ({x}, {y})");
            assert!(output.wave.count_possible(x, y) > 0, "cell ({x}, {y})");
        }
    }
}

#[test]
fn test_no_foundation_starts_fully_open() {
    let model = checkerboard_model(3, 3);
    let output = create_output(&model);
    for x in 0..3 {
        for y in 0..3 {
            assert_eq!(output.wave.count_possible(x, y), model.num_patterns());
        }
    }
}
