//! Job configuration files, tile catalogs, and runtime defaults
//!
//! A samples file names a batch of generation jobs, each with its own
//! options; tile catalogs describe a tile set with symmetry classes and
//! adjacency declarations. Both are JSON.

use crate::io::error::{Result, WfcError, invalid_parameter};
use crate::model::tiled::{NeighborDecl, TileCatalog, TileDecl, TileSymmetry};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Fixed master seed for reproducible batches
pub const DEFAULT_SEED: u64 = 42;

/// Retry budget per requested output
pub const DEFAULT_ATTEMPTS: usize = 10;

/// Nearest-neighbor upscale factor applied to exported images
pub const UPSCALE: u32 = 4;

/// Solve iterations between recorded animation frames
pub const GIF_FRAME_INTERVAL: usize = 16;

/// Delay between animation frames
pub const GIF_FRAME_DELAY_MS: u32 = 10;

/// Pause on the final animation frame
pub const GIF_END_PAUSE_MS: u32 = 2000;

const fn default_n() -> usize {
    3
}

const fn default_dimension() -> usize {
    48
}

const fn default_symmetry() -> usize {
    8
}

const fn default_true() -> bool {
    true
}

const fn default_screenshots() -> usize {
    2
}

const fn default_tile_size() -> usize {
    16
}

const fn default_weight() -> f64 {
    1.0
}

fn default_symmetry_class() -> String {
    "X".to_owned()
}

/// One overlapping-model job
#[derive(Clone, Debug, Deserialize)]
pub struct OverlappingJob {
    /// Exemplar image filename, relative to the samples file's `image_dir`
    pub image: String,
    /// Pattern window side length
    #[serde(default = "default_n")]
    pub n: usize,
    /// Output width in cells
    #[serde(default = "default_dimension")]
    pub width: usize,
    /// Output height in cells
    #[serde(default = "default_dimension")]
    pub height: usize,
    /// Number of symmetry transforms sampled per window, 1 to 8
    #[serde(default = "default_symmetry")]
    pub symmetry: usize,
    /// Treat the exemplar as toroidal when sampling
    #[serde(default = "default_true")]
    pub periodic_in: bool,
    /// Make the output wrap toroidally
    #[serde(default = "default_true")]
    pub periodic_out: bool,
    /// Pin a bottom-row foundation pattern
    #[serde(default)]
    pub foundation: bool,
    /// Iteration budget per attempt, 0 meaning unbounded
    #[serde(default)]
    pub limit: usize,
    /// Outputs to produce for this job
    #[serde(default = "default_screenshots")]
    pub screenshots: usize,
}

/// One tile-model job
#[derive(Clone, Debug, Deserialize)]
pub struct TiledJob {
    /// Catalog directory under the samples file's `image_dir`
    pub subdir: String,
    /// Named catalog subset to restrict the tile set to
    #[serde(default)]
    pub subset: Option<String>,
    /// Make the output wrap toroidally
    #[serde(default)]
    pub periodic: bool,
    /// Output width in cells
    #[serde(default = "default_dimension")]
    pub width: usize,
    /// Output height in cells
    #[serde(default = "default_dimension")]
    pub height: usize,
    /// Iteration budget per attempt, 0 meaning unbounded
    #[serde(default)]
    pub limit: usize,
    /// Outputs to produce for this job
    #[serde(default = "default_screenshots")]
    pub screenshots: usize,
}

/// A batch of named generation jobs
#[derive(Debug, Deserialize)]
pub struct SamplesConfig {
    /// Directory holding exemplar images and tile catalog subdirectories
    pub image_dir: PathBuf,
    /// Overlapping-model jobs by name
    #[serde(default)]
    pub overlapping: BTreeMap<String, OverlappingJob>,
    /// Tile-model jobs by name
    #[serde(default)]
    pub tiled: BTreeMap<String, TiledJob>,
}

/// Load and parse a samples file
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSON of the
/// expected shape.
pub fn load_samples(path: &Path) -> Result<SamplesConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| WfcError::FileSystem {
        path: path.to_path_buf(),
        operation: "read samples file",
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| WfcError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[derive(Debug, Deserialize)]
struct TileEntry {
    name: String,
    #[serde(default = "default_symmetry_class")]
    symmetry: String,
    #[serde(default = "default_weight")]
    weight: f64,
}

#[derive(Debug, Deserialize)]
struct NeighborEntry {
    left: String,
    right: String,
}

#[derive(Debug, Deserialize)]
struct TileCatalogFile {
    #[serde(default = "default_tile_size")]
    tile_size: usize,
    #[serde(default)]
    unique: bool,
    tiles: Vec<TileEntry>,
    #[serde(default)]
    neighbors: Vec<NeighborEntry>,
    #[serde(default)]
    subsets: BTreeMap<String, Vec<String>>,
}

fn parse_symmetry_class(text: &str) -> Result<TileSymmetry> {
    match text {
        "X" => Ok(TileSymmetry::X),
        "L" => Ok(TileSymmetry::L),
        "T" => Ok(TileSymmetry::T),
        "I" => Ok(TileSymmetry::I),
        "\\" => Ok(TileSymmetry::Diagonal),
        other => Err(invalid_parameter(
            "symmetry",
            &other,
            &"expected one of X, L, T, I, \\",
        )),
    }
}

/// Parse a "`name` `orientation`" tile reference; orientation defaults to 0
fn parse_reference(text: &str) -> Result<(String, usize)> {
    let mut parts = text.split_whitespace();
    let name = parts
        .next()
        .ok_or_else(|| invalid_parameter("neighbor", &text, &"tile name is empty"))?;
    let orientation = match parts.next() {
        Some(digits) => digits.parse::<usize>().map_err(|_| {
            invalid_parameter("neighbor", &text, &"orientation must be an integer")
        })?,
        None => 0,
    };
    Ok((name.to_owned(), orientation))
}

/// Load and parse a tile catalog file
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON, or names
/// an unknown symmetry class or malformed neighbor reference.
pub fn load_tile_catalog(path: &Path) -> Result<TileCatalog> {
    let text = std::fs::read_to_string(path).map_err(|e| WfcError::FileSystem {
        path: path.to_path_buf(),
        operation: "read tile catalog",
        source: e,
    })?;
    let file: TileCatalogFile = serde_json::from_str(&text).map_err(|e| WfcError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut tiles = Vec::with_capacity(file.tiles.len());
    for entry in file.tiles {
        tiles.push(TileDecl {
            name: entry.name,
            symmetry: parse_symmetry_class(&entry.symmetry)?,
            weight: entry.weight,
        });
    }

    let mut neighbors = Vec::with_capacity(file.neighbors.len());
    for entry in file.neighbors {
        neighbors.push(NeighborDecl {
            left: parse_reference(&entry.left)?,
            right: parse_reference(&entry.right)?,
        });
    }

    Ok(TileCatalog {
        tile_size: file.tile_size,
        unique: file.unique,
        tiles,
        neighbors,
        subsets: file.subsets,
    })
}
