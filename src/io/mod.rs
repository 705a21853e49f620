//! Input/output operations, configuration, and error handling

/// GIF recording of the collapse in progress
pub mod animation;
/// Command-line interface and the batch job runner
pub mod cli;
/// Job configuration files and runtime defaults
pub mod config;
/// Error types for generation operations
pub mod error;
/// Image decoding into paletted grids and PNG export
pub mod image;
/// Batch progress display
pub mod progress;
