//! GIF recording of the collapse in progress
//!
//! Implements the solver's frame sink so the run loop stays decoupled from
//! the encoder: frames are buffered upscaled and written out in one pass
//! when the attempt ends.

use crate::io::error::{Result, WfcError};
use crate::io::image::upscale;
use crate::solver::run::FrameSink;
use image::{Delay, Frame, RgbaImage};
use std::path::Path;

/// Buffers solver frames and encodes them as an animated GIF
pub struct GifRecorder {
    frames: Vec<Frame>,
    upscale_factor: u32,
}

impl GifRecorder {
    /// Create a recorder upscaling every frame by `upscale_factor`
    pub const fn new(upscale_factor: u32) -> Self {
        Self {
            frames: Vec::new(),
            upscale_factor,
        }
    }

    /// Number of frames recorded so far
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Encode the recorded frames as a GIF at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory or file cannot be created
    /// or GIF encoding fails.
    pub fn export(self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WfcError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source: e,
            })?;
        }

        let file = std::fs::File::create(path).map_err(|e| WfcError::FileSystem {
            path: path.to_path_buf(),
            operation: "create file",
            source: e,
        })?;

        let mut encoder = image::codecs::gif::GifEncoder::new(file);
        encoder
            .encode_frames(self.frames)
            .map_err(|e| WfcError::ImageExport {
                path: path.to_path_buf(),
                source: e,
            })
    }
}

impl FrameSink for GifRecorder {
    fn push_frame(&mut self, image: &RgbaImage, delay_ms: u32) -> Result<()> {
        self.frames.push(Frame::from_parts(
            upscale(image, self.upscale_factor),
            0,
            0,
            Delay::from_numer_denom_ms(delay_ms, 1),
        ));
        Ok(())
    }
}
