//! Dense per-run solver state: the possibility wave and the dirty-cell map
//!
//! Both bitmaps are flat bit arrays addressed through bounds-checked
//! accessors. Wave bits start true and only ever flip true to false, so a
//! run's state shrinks monotonically toward either a solution or a
//! contradiction.

use bitvec::prelude::{BitVec, bitvec};

/// Per-cell pattern possibility bitmap
///
/// `get(x, y, t)` answers whether pattern `t` is still possible at output
/// cell `(x, y)`. All bits start true; `ban` is the only mutation.
#[derive(Clone, Debug)]
pub struct Wave {
    width: usize,
    height: usize,
    num_patterns: usize,
    bits: BitVec,
}

impl Wave {
    /// Create a wave with every pattern possible at every cell
    pub fn new(width: usize, height: usize, num_patterns: usize) -> Self {
        Self {
            width,
            height,
            num_patterns,
            bits: bitvec![1; width * height * num_patterns],
        }
    }

    const fn index(&self, x: usize, y: usize, t: usize) -> Option<usize> {
        if x < self.width && y < self.height && t < self.num_patterns {
            Some((x * self.height + y) * self.num_patterns + t)
        } else {
            None
        }
    }

    /// Test whether pattern `t` is still possible at `(x, y)`
    ///
    /// Out-of-range coordinates read as impossible.
    pub fn get(&self, x: usize, y: usize, t: usize) -> bool {
        self.index(x, y, t)
            .and_then(|i| self.bits.get(i).as_deref().copied())
            .unwrap_or(false)
    }

    /// Remove pattern `t` from the possibility set of `(x, y)`
    pub fn ban(&mut self, x: usize, y: usize, t: usize) {
        if let Some(i) = self.index(x, y, t) {
            self.bits.set(i, false);
        }
    }

    /// Collapse `(x, y)` to the single pattern `chosen`
    pub fn collapse_to(&mut self, x: usize, y: usize, chosen: usize) {
        for t in 0..self.num_patterns {
            if t != chosen {
                self.ban(x, y, t);
            }
        }
    }

    /// Count the patterns still possible at `(x, y)`
    pub fn count_possible(&self, x: usize, y: usize) -> usize {
        (0..self.num_patterns).filter(|&t| self.get(x, y, t)).count()
    }

    /// Find the single remaining pattern at `(x, y)`, if the cell is frozen
    pub fn frozen_pattern(&self, x: usize, y: usize) -> Option<usize> {
        let mut found = None;
        for t in 0..self.num_patterns {
            if self.get(x, y, t) {
                if found.is_some() {
                    return None;
                }
                found = Some(t);
            }
        }
        found
    }

    /// Grid width in cells
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of patterns tracked per cell
    pub const fn num_patterns(&self) -> usize {
        self.num_patterns
    }
}

/// Per-cell "needs propagation" bitmap
///
/// A set bit means the cell lost a possibility since it was last fully
/// propagated; the propagation pass treats set bits as its work list.
#[derive(Clone, Debug)]
pub struct ChangeMap {
    width: usize,
    height: usize,
    bits: BitVec,
}

impl ChangeMap {
    /// Create a change map with no cell dirty
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: bitvec![0; width * height],
        }
    }

    const fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(x * self.height + y)
        } else {
            None
        }
    }

    /// Test whether `(x, y)` is awaiting propagation
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.index(x, y)
            .and_then(|i| self.bits.get(i).as_deref().copied())
            .unwrap_or(false)
    }

    /// Mark `(x, y)` as awaiting propagation
    pub fn set(&mut self, x: usize, y: usize) {
        if let Some(i) = self.index(x, y) {
            self.bits.set(i, true);
        }
    }

    /// Clear the dirty flag of `(x, y)`
    pub fn clear(&mut self, x: usize, y: usize) {
        if let Some(i) = self.index(x, y) {
            self.bits.set(i, false);
        }
    }
}

/// Mutable state of one generation attempt
///
/// Built fresh per attempt and discarded on success, contradiction, or
/// iteration budget exhaustion. The model it was built for stays read-only.
#[derive(Clone, Debug)]
pub struct Output {
    /// Pattern possibility bitmap, cell by cell
    pub wave: Wave,
    /// Cells with removals not yet propagated to their neighbors
    pub changes: ChangeMap,
}

impl Output {
    /// Create an output with an all-true wave and a clean change map
    pub fn new(width: usize, height: usize, num_patterns: usize) -> Self {
        Self {
            wave: Wave::new(width, height, num_patterns),
            changes: ChangeMap::new(width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_starts_full_and_bans_stick() {
        let mut wave = Wave::new(2, 2, 3);
        assert_eq!(wave.count_possible(1, 1), 3);

        wave.ban(1, 1, 0);
        wave.ban(1, 1, 0);
        assert_eq!(wave.count_possible(1, 1), 2);
        assert!(!wave.get(1, 1, 0));
        assert!(wave.get(1, 1, 2));
    }

    #[test]
    fn wave_out_of_range_reads_false() {
        let wave = Wave::new(2, 2, 2);
        assert!(!wave.get(2, 0, 0));
        assert!(!wave.get(0, 2, 0));
        assert!(!wave.get(0, 0, 2));
    }

    #[test]
    fn collapse_leaves_exactly_one() {
        let mut wave = Wave::new(1, 1, 4);
        wave.collapse_to(0, 0, 2);
        assert_eq!(wave.count_possible(0, 0), 1);
        assert_eq!(wave.frozen_pattern(0, 0), Some(2));
    }

    #[test]
    fn change_map_set_and_clear() {
        let mut changes = ChangeMap::new(3, 3);
        assert!(!changes.get(1, 2));
        changes.set(1, 2);
        assert!(changes.get(1, 2));
        changes.clear(1, 2);
        assert!(!changes.get(1, 2));
    }
}
