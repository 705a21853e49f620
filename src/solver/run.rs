//! The top-level solve loop: observe, propagate to a fixed point, repeat
//!
//! Frames of the collapse in progress go to an optional injectable sink, so
//! the loop has no compile-time coupling to any particular encoder.

use crate::io::config::{GIF_END_PAUSE_MS, GIF_FRAME_DELAY_MS, GIF_FRAME_INTERVAL};
use crate::io::error::Result;
use crate::model::Model;
use crate::solver::observe::{RunStatus, observe};
use crate::solver::wave::Output;
use image::RgbaImage;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Receiver of intermediate and final frames of a solve
pub trait FrameSink {
    /// Accept one rendered frame with its display delay
    ///
    /// # Errors
    ///
    /// Returns an error when the sink cannot record the frame.
    fn push_frame(&mut self, image: &RgbaImage, delay_ms: u32) -> Result<()>;
}

/// Status and iteration count of one finished attempt
#[derive(Clone, Copy, Debug)]
pub struct RunReport {
    /// Terminal status of the attempt
    pub status: RunStatus,
    /// Observe/propagate iterations performed
    pub iterations: usize,
}

/// Create the per-attempt state for a model, applying foundation pinning
///
/// With no foundation the wave starts fully open. A foundation pattern is
/// forced along the bottom row, banned everywhere else, and the implied
/// constraints are propagated to a fixed point column by column before the
/// output is handed back.
pub fn create_output(model: &dyn Model) -> Output {
    let mut output = Output::new(model.width(), model.height(), model.num_patterns());

    if let Some(foundation) = model.foundation() {
        let bottom = model.height() - 1;
        for x in 0..model.width() {
            for t in 0..model.num_patterns() {
                if t != foundation {
                    output.wave.ban(x, bottom, t);
                }
            }
            output.changes.set(x, bottom);

            for y in 0..bottom {
                output.wave.ban(x, y, foundation);
                output.changes.set(x, y);
            }

            while model.propagate(&mut output) {}
        }
    }

    output
}

/// Shift an image one pixel down-right with toroidal wrap
///
/// Used to scroll periodic results diagonally in the animation coda.
pub fn scroll_diagonally(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut result = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return result;
    }
    for y in 0..height {
        for x in 0..width {
            let pixel = *image.get_pixel((x + 1) % width, (y + 1) % height);
            result.put_pixel(x, y, pixel);
        }
    }
    result
}

/// Drive one attempt to success, contradiction, or budget exhaustion
///
/// Each iteration observes once and then propagates to a fixed point.
/// `limit` caps the number of iterations, 0 meaning unbounded. Every
/// [`GIF_FRAME_INTERVAL`]-th iteration emits a frame to `frames`; terminal
/// states add a long pause frame and, for periodic outputs, a diagonal
/// scroll sequence.
///
/// # Errors
///
/// Returns an error only when the frame sink fails; contradiction and
/// exhaustion are reported through [`RunStatus`].
pub fn run(
    model: &dyn Model,
    output: &mut Output,
    seed: u64,
    limit: usize,
    mut frames: Option<&mut dyn FrameSink>,
) -> Result<RunReport> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut iteration = 0usize;

    while limit == 0 || iteration < limit {
        let status = observe(model, output, &mut rng);

        if let Some(sink) = frames.as_deref_mut() {
            if iteration % GIF_FRAME_INTERVAL == 0 {
                sink.push_frame(&model.image(output), GIF_FRAME_DELAY_MS)?;
            }
        }

        if status == RunStatus::Unfinished {
            while model.propagate(output) {}
            iteration += 1;
            continue;
        }

        if let Some(sink) = frames.as_deref_mut() {
            let mut image = model.image(output);
            sink.push_frame(&image, GIF_END_PAUSE_MS)?;

            if model.periodic_out() {
                for _ in 0..model.width() {
                    image = scroll_diagonally(&image);
                    sink.push_frame(&image, GIF_FRAME_DELAY_MS)?;
                }
            }
        }

        return Ok(RunReport {
            status,
            iterations: iteration,
        });
    }

    Ok(RunReport {
        status: RunStatus::Unfinished,
        iterations: limit,
    })
}
