//! The constraint solver: wave state, observation, and the run loop

/// Entropy scan and weighted-random collapse
pub mod observe;
/// Top-level solve loop and frame emission
pub mod run;
/// Possibility wave and dirty-cell bitmaps
pub mod wave;

pub use observe::{CellChoice, RunStatus, find_lowest_entropy, observe};
pub use run::{FrameSink, RunReport, create_output, run};
pub use wave::{ChangeMap, Output, Wave};
