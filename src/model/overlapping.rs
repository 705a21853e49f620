//! Rule strategy derived from pairwise pattern-offset agreement
//!
//! For every ordered pattern pair and every offset within the
//! (2n−1)×(2n−1) kernel, construction records which patterns agree on the
//! overlapping pixels. Propagation then removes any pattern whose every
//! supporter at some offset has been eliminated.

use crate::io::error::{Result, invalid_parameter, invalid_sample};
use crate::model::Model;
use crate::model::pattern::{
    ColorIndex, Pattern, PatternHash, PatternIndex, PatternPrevalence, Rgba,
};
use crate::solver::wave::Output;
use image::{Rgba as ImageRgba, RgbaImage};
use ndarray::{Array2, Array3};

/// Test pixel agreement of two patterns at a relative offset
fn agrees(p1: &Pattern, p2: &Pattern, dx: isize, dy: isize) -> bool {
    let n = p1.size() as isize;
    let (xmin, xmax) = if dx < 0 { (0, dx + n) } else { (dx, n) };
    let (ymin, ymax) = if dy < 0 { (0, dy + n) } else { (dy, n) };
    for y in ymin..ymax {
        for x in xmin..xmax {
            let a = p1.at(x as usize, y as usize);
            let b = p2.at((x - dx) as usize, (y - dy) as usize);
            if a != b {
                return false;
            }
        }
    }
    true
}

/// Model whose propagation rule comes from N×N pattern overlap
pub struct OverlappingModel {
    n: usize,
    width: usize,
    height: usize,
    periodic_out: bool,
    foundation: Option<usize>,
    patterns: Vec<Pattern>,
    weights: Vec<f64>,
    palette: Vec<Rgba>,
    // num_patterns x (2n-1) x (2n-1); each entry lists the patterns that
    // agree with the indexing pattern at that offset
    propagator: Array3<Vec<PatternIndex>>,
}

impl OverlappingModel {
    /// Build the model from extracted pattern prevalence
    ///
    /// Patterns receive dense indices in prevalence iteration order (the
    /// map is ordered, so assignment is deterministic), weights equal to
    /// their occurrence counts, and the pattern matching `foundation_hash`
    /// is recorded for bottom-row pinning.
    ///
    /// # Errors
    ///
    /// Returns an error if the prevalence map is empty, holds more patterns
    /// than a dense [`PatternIndex`] can address, or the output dimensions
    /// are zero.
    pub fn new(
        prevalence: &PatternPrevalence,
        palette: Vec<Rgba>,
        n: usize,
        periodic_out: bool,
        width: usize,
        height: usize,
        foundation_hash: Option<PatternHash>,
    ) -> Result<Self> {
        if prevalence.is_empty() {
            return Err(invalid_sample(&"no patterns were extracted"));
        }
        if prevalence.len() > usize::from(PatternIndex::MAX) {
            return Err(invalid_sample(&format!(
                "{} patterns exceed the dense index range",
                prevalence.len()
            )));
        }
        if width == 0 || height == 0 {
            return Err(invalid_parameter(
                "width/height",
                &format!("{width}x{height}"),
                &"output dimensions must be positive",
            ));
        }

        let mut patterns = Vec::with_capacity(prevalence.len());
        let mut weights = Vec::with_capacity(prevalence.len());
        let mut foundation = None;

        for (&hash, &count) in prevalence {
            if Some(hash) == foundation_hash {
                foundation = Some(patterns.len());
            }
            patterns.push(Pattern::from_hash(hash, n, palette.len()));
            weights.push(count as f64);
        }

        let num_patterns = patterns.len();
        let kernel = 2 * n - 1;
        let mut propagator = Array3::from_elem((num_patterns, kernel, kernel), Vec::new());

        for t in 0..num_patterns {
            for kx in 0..kernel {
                for ky in 0..kernel {
                    let dx = kx as isize - (n as isize - 1);
                    let dy = ky as isize - (n as isize - 1);
                    let mut list = Vec::new();
                    for t2 in 0..num_patterns {
                        let (Some(p1), Some(p2)) = (patterns.get(t), patterns.get(t2)) else {
                            continue;
                        };
                        if agrees(p1, p2, dx, dy) {
                            list.push(t2 as PatternIndex);
                        }
                    }
                    list.shrink_to_fit();
                    if let Some(slot) = propagator.get_mut((t, kx, ky)) {
                        *slot = list;
                    }
                }
            }
        }

        Ok(Self {
            n,
            width,
            height,
            periodic_out,
            foundation,
            patterns,
            weights,
            palette,
            propagator,
        })
    }

    /// Patterns that agree with pattern `t` at offset `(dx, dy)`
    ///
    /// Offsets outside the (2n−1)×(2n−1) kernel report no supporters.
    pub fn supporters(&self, t: usize, dx: isize, dy: isize) -> &[PatternIndex] {
        let kx = dx + self.n as isize - 1;
        let ky = dy + self.n as isize - 1;
        if kx < 0 || ky < 0 {
            return &[];
        }
        self.propagator
            .get((t, kx as usize, ky as usize))
            .map_or(&[], Vec::as_slice)
    }

    /// Color contributions of every still-possible pattern per output pixel
    fn graphics(&self, output: &Output) -> Array2<Vec<ColorIndex>> {
        let mut result = Array2::from_elem((self.width, self.height), Vec::new());
        for y in 0..self.height {
            for x in 0..self.width {
                let mut contributors = Vec::new();

                for dy in 0..self.n {
                    for dx in 0..self.n {
                        let mut sx = x as isize - dx as isize;
                        if sx < 0 {
                            sx += self.width as isize;
                        }
                        let mut sy = y as isize - dy as isize;
                        if sy < 0 {
                            sy += self.height as isize;
                        }
                        let (sx, sy) = (sx as usize, sy as usize);
                        if self.on_boundary(sx, sy) {
                            continue;
                        }

                        for (t, pattern) in self.patterns.iter().enumerate() {
                            if output.wave.get(sx, sy, t) {
                                contributors.push(pattern.at(dx, dy));
                            }
                        }
                    }
                }

                if let Some(cell) = result.get_mut((x, y)) {
                    *cell = contributors;
                }
            }
        }
        result
    }

    fn color_of(&self, index: ColorIndex) -> Rgba {
        self.palette
            .get(usize::from(index))
            .copied()
            .unwrap_or([0, 0, 0, 255])
    }
}

impl Model for OverlappingModel {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn num_patterns(&self) -> usize {
        self.patterns.len()
    }

    fn periodic_out(&self) -> bool {
        self.periodic_out
    }

    fn pattern_weight(&self, t: usize) -> f64 {
        self.weights.get(t).copied().unwrap_or(0.0)
    }

    fn foundation(&self) -> Option<usize> {
        self.foundation
    }

    fn on_boundary(&self, x: usize, y: usize) -> bool {
        !self.periodic_out && (x + self.n > self.width || y + self.n > self.height)
    }

    fn propagate(&self, output: &mut Output) -> bool {
        let mut did_change = false;
        let n = self.n as isize;
        let (width, height) = (self.width as isize, self.height as isize);

        for x1 in 0..self.width {
            for y1 in 0..self.height {
                if !output.changes.get(x1, y1) {
                    continue;
                }
                output.changes.clear(x1, y1);

                for dx in (1 - n)..n {
                    for dy in (1 - n)..n {
                        let mut sx = x1 as isize + dx;
                        if sx < 0 {
                            sx += width;
                        } else if sx >= width {
                            sx -= width;
                        }

                        let mut sy = y1 as isize + dy;
                        if sy < 0 {
                            sy += height;
                        } else if sy >= height {
                            sy -= height;
                        }

                        let (sx, sy) = (sx as usize, sy as usize);
                        if !self.periodic_out && (sx + self.n > self.width || sy + self.n > self.height)
                        {
                            continue;
                        }

                        for t2 in 0..self.patterns.len() {
                            if !output.wave.get(sx, sy, t2) {
                                continue;
                            }

                            // t2 survives at the neighbor only while some
                            // pattern at (x1, y1) still agrees with it at
                            // the opposite offset
                            let supported = self
                                .supporters(t2, -dx, -dy)
                                .iter()
                                .any(|&t3| output.wave.get(x1, y1, usize::from(t3)));

                            if !supported {
                                output.changes.set(sx, sy);
                                output.wave.ban(sx, sy, t2);
                                did_change = true;
                            }
                        }
                    }
                }
            }
        }

        did_change
    }

    fn image(&self, output: &Output) -> RgbaImage {
        let graphics = self.graphics(output);
        let mut img = RgbaImage::new(self.width as u32, self.height as u32);

        for y in 0..self.height {
            for x in 0..self.width {
                let contributors = graphics.get((x, y)).map_or(&[][..], Vec::as_slice);
                let color = match contributors {
                    [] => [0, 0, 0, 255],
                    [single] => self.color_of(*single),
                    many => {
                        // Unweighted integer mean per channel, truncating
                        let mut sums = [0usize; 4];
                        for &index in many {
                            let rgba = self.color_of(index);
                            for (sum, channel) in sums.iter_mut().zip(rgba.iter()) {
                                *sum += usize::from(*channel);
                            }
                        }
                        let count = many.len();
                        [
                            (sums[0] / count) as u8,
                            (sums[1] / count) as u8,
                            (sums[2] / count) as u8,
                            (sums[3] / count) as u8,
                        ]
                    }
                };
                img.put_pixel(x as u32, y as u32, ImageRgba(color));
            }
        }

        img
    }
}
