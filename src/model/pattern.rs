//! Pattern extraction from paletted exemplar images
//!
//! Slides an N×N window over the exemplar, expands each window through the
//! requested symmetry transforms, and counts how often every distinct
//! pattern occurs. Patterns are deduplicated by a 64-bit content hash that
//! losslessly encodes the index grid for the palette sizes this crate
//! accepts.

use crate::io::error::{Result, invalid_parameter, invalid_sample};
use std::collections::BTreeMap;

/// Index into a palette or tile set
pub type ColorIndex = u8;

/// Lossless 64-bit encoding of a pattern's index grid
pub type PatternHash = u64;

/// Dense pattern index assigned at model construction
pub type PatternIndex = u16;

/// One RGBA color
pub type Rgba = [u8; 4];

/// Occurrence count per distinct pattern, keyed by content hash
///
/// An ordered map, so downstream pattern-index assignment is deterministic
/// across runs and platforms.
pub type PatternPrevalence = BTreeMap<PatternHash, usize>;

/// Largest palette a `ColorIndex` can address
pub const MAX_COLORS: usize = 256;

/// Exemplar pixel grid with indices into an ordered palette
#[derive(Clone, Debug)]
pub struct PalettedImage {
    /// Grid width in pixels
    pub width: usize,
    /// Grid height in pixels
    pub height: usize,
    /// Row-major palette indices, `width * height` entries
    pub data: Vec<ColorIndex>,
    /// Ordered list of RGBA colors the indices refer to
    pub palette: Vec<Rgba>,
}

impl PalettedImage {
    /// Read the pixel at `(x, y)`, wrapping both coordinates toroidally
    pub fn at_wrapped(&self, x: usize, y: usize) -> ColorIndex {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        self.data
            .get(self.width * (y % self.height) + (x % self.width))
            .copied()
            .unwrap_or(0)
    }
}

/// An N×N grid of color or tile indices
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Pattern {
    n: usize,
    cells: Vec<ColorIndex>,
}

impl Pattern {
    /// Build an N×N pattern from a per-cell function
    pub fn from_fn(n: usize, f: impl Fn(usize, usize) -> ColorIndex) -> Self {
        let mut cells = Vec::with_capacity(n * n);
        for dy in 0..n {
            for dx in 0..n {
                cells.push(f(dx, dy));
            }
        }
        Self { n, cells }
    }

    /// Read the cell at `(x, y)`; out-of-range reads as index 0
    pub fn at(&self, x: usize, y: usize) -> ColorIndex {
        if x < self.n && y < self.n {
            self.cells.get(y * self.n + x).copied().unwrap_or(0)
        } else {
            0
        }
    }

    /// Side length of the pattern
    pub const fn size(&self) -> usize {
        self.n
    }

    /// The pattern rotated a quarter turn
    #[must_use]
    pub fn rotated(&self) -> Self {
        Self::from_fn(self.n, |x, y| self.at(self.n - 1 - y, x))
    }

    /// The pattern reflected horizontally
    #[must_use]
    pub fn reflected(&self) -> Self {
        Self::from_fn(self.n, |x, y| self.at(self.n - 1 - x, y))
    }

    /// Content hash encoding the index grid in base `palette_size`
    ///
    /// Lossless whenever `palette_size^(n*n)` fits in 64 bits, which
    /// [`extract_patterns`] validates up front.
    pub fn hash(&self, palette_size: usize) -> PatternHash {
        let base = palette_size as PatternHash;
        self.cells
            .iter()
            .fold(0, |acc, &c| acc.wrapping_mul(base).wrapping_add(PatternHash::from(c)))
    }

    /// Reconstruct the pattern a hash encodes
    pub fn from_hash(hash: PatternHash, n: usize, palette_size: usize) -> Self {
        let base = palette_size.max(1) as PatternHash;
        let mut cells = vec![0; n * n];
        let mut residue = hash;
        for cell in cells.iter_mut().rev() {
            *cell = (residue % base) as ColorIndex;
            residue /= base;
        }
        Self { n, cells }
    }
}

/// Test whether `palette_size^(n*n)` fits in a 64-bit hash
fn hash_is_lossless(palette_size: usize, n: usize) -> bool {
    let base = palette_size as u64;
    let mut acc: u64 = 1;
    for _ in 0..n * n {
        match acc.checked_mul(base) {
            Some(next) => acc = next,
            None => return false,
        }
    }
    true
}

/// Result of pattern extraction
#[derive(Debug)]
pub struct ExtractedPatterns {
    /// Occurrence count per distinct pattern
    pub prevalence: PatternPrevalence,
    /// Hash of the synthesized foundation pattern, when one was requested
    pub foundation: Option<PatternHash>,
}

/// Extract N×N patterns and their prevalence from an exemplar
///
/// Every valid window position contributes the first `symmetry` transforms
/// of its pattern, in the fixed order identity, reflection, rotation,
/// reflected rotation, and so on through the dihedral group. When
/// `periodic_in` is set the window wraps around both edges.
///
/// When `with_foundation` is set, an extra pattern is synthesized from the
/// exemplar's bottom row (replicated vertically), registered in the
/// prevalence map, and its hash reported for ground pinning downstream.
///
/// # Errors
///
/// Returns an error if `n` or `symmetry` is out of range, the exemplar is
/// smaller than the window, the palette is empty or oversized, or the
/// palette/pattern-size combination would make the content hash lossy.
pub fn extract_patterns(
    sample: &PalettedImage,
    n: usize,
    periodic_in: bool,
    symmetry: usize,
    with_foundation: bool,
) -> Result<ExtractedPatterns> {
    if n == 0 {
        return Err(invalid_parameter("n", &n, &"pattern size must be at least 1"));
    }
    if !(1..=8).contains(&symmetry) {
        return Err(invalid_parameter(
            "symmetry",
            &symmetry,
            &"must be between 1 and 8",
        ));
    }
    if n > sample.width || n > sample.height {
        return Err(invalid_sample(&format!(
            "{}x{} exemplar is smaller than the {n}x{n} pattern window",
            sample.width, sample.height
        )));
    }
    if sample.palette.is_empty() || sample.palette.len() > MAX_COLORS {
        return Err(invalid_sample(&format!(
            "palette must have 1 to {MAX_COLORS} colors, found {}",
            sample.palette.len()
        )));
    }
    if !hash_is_lossless(sample.palette.len(), n) {
        return Err(invalid_sample(&format!(
            "{} colors at pattern size {n} exceed the 64-bit pattern hash",
            sample.palette.len()
        )));
    }

    let palette_size = sample.palette.len();
    let mut prevalence = PatternPrevalence::new();

    let max_y = if periodic_in { sample.height } else { sample.height - n + 1 };
    let max_x = if periodic_in { sample.width } else { sample.width - n + 1 };

    for y in 0..max_y {
        for x in 0..max_x {
            let base = Pattern::from_fn(n, |dx, dy| sample.at_wrapped(x + dx, y + dy));

            let mut transforms = Vec::with_capacity(symmetry);
            let mut current = base;
            loop {
                transforms.push(current.clone());
                if transforms.len() >= symmetry {
                    break;
                }
                transforms.push(current.reflected());
                if transforms.len() >= symmetry {
                    break;
                }
                current = current.rotated();
            }
            // The dihedral order is id, refl, rot, refl-rot, ..., so the
            // reflection of each rotation directly follows it.
            for p in transforms.iter().take(symmetry) {
                *prevalence.entry(p.hash(palette_size)).or_insert(0) += 1;
            }
        }
    }

    let foundation = if with_foundation {
        let bottom = sample.height - 1;
        let ground = Pattern::from_fn(n, |dx, _dy| sample.at_wrapped(dx, bottom));
        let hash = ground.hash(palette_size);
        *prevalence.entry(hash).or_insert(0) += 1;
        Some(hash)
    } else {
        None
    };

    Ok(ExtractedPatterns {
        prevalence,
        foundation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> PalettedImage {
        PalettedImage {
            width: 2,
            height: 2,
            data: vec![0, 1, 1, 0],
            palette: vec![[0, 0, 0, 255], [255, 255, 255, 255]],
        }
    }

    #[test]
    fn hash_round_trips() {
        let p = Pattern::from_fn(3, |x, y| ((x + 2 * y) % 4) as ColorIndex);
        let hash = p.hash(4);
        assert_eq!(Pattern::from_hash(hash, 3, 4), p);
    }

    #[test]
    fn rotation_has_order_four() {
        let p = Pattern::from_fn(3, |x, y| (x + 3 * y) as ColorIndex);
        let back = p.rotated().rotated().rotated().rotated();
        assert_eq!(back, p);
        assert_ne!(p.rotated(), p);
    }

    #[test]
    fn reflection_is_involutive() {
        let p = Pattern::from_fn(2, |x, y| (x + 2 * y) as ColorIndex);
        assert_eq!(p.reflected().reflected(), p);
    }

    #[test]
    fn symmetry_transform_order_matches_dihedral_listing() {
        let sample = checker();
        let full = extract_patterns(&sample, 2, true, 8, false).unwrap();
        let identity_only = extract_patterns(&sample, 2, true, 1, false).unwrap();

        let total: usize = full.prevalence.values().sum();
        assert_eq!(total, 2 * 2 * 8);
        let base_total: usize = identity_only.prevalence.values().sum();
        assert_eq!(base_total, 2 * 2);
    }

    #[test]
    fn oversized_window_is_rejected() {
        let sample = checker();
        assert!(extract_patterns(&sample, 3, false, 1, false).is_err());
    }

    #[test]
    fn lossy_hash_is_rejected() {
        let mut sample = checker();
        sample.palette = vec![[0, 0, 0, 255]; 200];
        // 200^16 does not fit in 64 bits
        assert!(extract_patterns(&sample, 4, true, 1, false).is_err());
    }
}
