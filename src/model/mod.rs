//! Immutable rulesets driving constraint propagation
//!
//! A model is built once per job and shared read-only across every attempt:
//! it knows the output dimensions, the per-pattern weights, and the
//! propagation rule derived from the exemplar. Two rule strategies exist,
//! one from pairwise pattern-offset agreement and one from declared
//! tile-to-tile adjacency.

/// Overlapping N×N-pattern model
pub mod overlapping;
/// Pattern types, hashing, and exemplar extraction
pub mod pattern;
/// Adjacency-tile model
pub mod tiled;

use crate::solver::wave::Output;
use image::RgbaImage;

/// Capability interface shared by both rule strategies
///
/// Implementations are immutable after construction, so one model may serve
/// concurrent attempts without locking.
pub trait Model {
    /// Output grid width in cells
    fn width(&self) -> usize;

    /// Output grid height in cells
    fn height(&self) -> usize;

    /// Number of distinct patterns the wave tracks per cell
    fn num_patterns(&self) -> usize;

    /// Whether the output wraps toroidally
    fn periodic_out(&self) -> bool;

    /// Prevalence-derived weight of pattern `t`
    fn pattern_weight(&self, t: usize) -> f64;

    /// Index of the pattern pinned to the bottom row, if any
    fn foundation(&self) -> Option<usize> {
        None
    }

    /// Whether `(x, y)` is excluded from entropy selection
    ///
    /// True when a non-periodic model cannot anchor a full pattern window at
    /// the cell.
    fn on_boundary(&self, x: usize, y: usize) -> bool;

    /// One constraint-tightening pass over all dirty cells
    ///
    /// Removes neighbor patterns that lost their last supporting pattern and
    /// marks the affected cells dirty. Returns whether any removal occurred;
    /// the caller loops until a pass reports none.
    fn propagate(&self, output: &mut Output) -> bool;

    /// Render the wave state into a pixel grid
    ///
    /// Cells still holding several possibilities render as a blend
    /// (overlapping model) or a neutral placeholder (tile model).
    fn image(&self, output: &Output) -> RgbaImage;
}
