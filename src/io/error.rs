//! Error types for model construction and the I/O collaborators
//!
//! Contradiction and iteration exhaustion are not errors: they are modeled
//! as solver return values. Errors here cover malformed exemplars, tile
//! catalogs, and filesystem or codec failures, all fatal for the job that
//! raised them but never for the rest of the batch.

use std::fmt;
use std::path::PathBuf;

/// Main error type for all generation jobs
#[derive(Debug)]
pub enum WfcError {
    /// Failed to load an exemplar or tile image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image decoding error
        source: image::ImageError,
    },

    /// Failed to save a generated image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image encoding error
        source: image::ImageError,
    },

    /// A job or tile catalog file could not be parsed
    ConfigParse {
        /// Path to the configuration file
        path: PathBuf,
        /// Underlying JSON parsing error
        source: serde_json::Error,
    },

    /// Exemplar data does not meet algorithm requirements
    ///
    /// Raised for empty pattern sets, oversized palettes, or pattern/palette
    /// combinations whose content hash would no longer be lossless.
    InvalidSample {
        /// Description of what is wrong with the exemplar
        reason: String,
    },

    /// An adjacency rule references a tile the catalog does not declare
    MissingTile {
        /// Name of the referenced tile
        name: String,
    },

    /// Job parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// General filesystem operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for WfcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::ConfigParse { path, source } => {
                write!(f, "Failed to parse '{}': {source}", path.display())
            }
            Self::InvalidSample { reason } => {
                write!(f, "Invalid exemplar: {reason}")
            }
            Self::MissingTile { name } => {
                write!(f, "Adjacency rule references unknown tile '{name}'")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for WfcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::ConfigParse { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for generation results
pub type Result<T> = std::result::Result<T, WfcError>;

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> WfcError {
    WfcError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create an invalid exemplar error
pub fn invalid_sample(reason: &impl ToString) -> WfcError {
    WfcError::InvalidSample {
        reason: reason.to_string(),
    }
}
