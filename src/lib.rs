//! Wave function collapse image generation from small exemplars
//!
//! The solver keeps a wave of per-cell pattern possibilities, repeatedly
//! collapses the least-certain cell, and propagates the consequences until
//! every cell is decided or a contradiction forces a retry. Rules come from
//! either overlapping N×N windows of an exemplar image or a declared tile
//! adjacency catalog.

#![forbid(unsafe_code)]

/// Input/output operations, configuration, and error handling
pub mod io;
/// Immutable rulesets driving constraint propagation
pub mod model;
/// The constraint solver: wave state, observation, and the run loop
pub mod solver;

pub use io::error::{Result, WfcError};
