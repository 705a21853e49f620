//! Rule strategy derived from declared tile-to-tile adjacency
//!
//! A catalog names tiles, each with a symmetry class that spawns derived
//! rotated/reflected instances, and declares which instance pairs may sit
//! next to each other. Construction expands the declarations through the
//! symmetry action maps into a dense boolean adjacency matrix over the four
//! cardinal directions.

use crate::io::error::{Result, WfcError, invalid_parameter, invalid_sample};
use crate::model::Model;
use crate::model::pattern::Rgba;
use crate::solver::wave::Output;
use image::{Rgba as ImageRgba, RgbaImage};
use ndarray::Array3;
use std::collections::BTreeMap;

/// Placeholder color for cells that are not yet frozen
const UNDECIDED_COLOR: Rgba = [128, 128, 128, 255];

/// Neighbor offsets per direction index: -x, +y, +x, -y
const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

/// Symmetry class of a tile, naming its distinct orientations
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileSymmetry {
    /// Fully symmetric, one instance
    X,
    /// Four distinct rotations, reflection flips between adjacent ones
    L,
    /// Four distinct rotations, reflection fixes the vertical axis
    T,
    /// Two distinct rotations, reflection-invariant
    I,
    /// Two distinct rotations, reflection swaps them
    Diagonal,
}

impl TileSymmetry {
    /// Number of distinct orientation instances
    pub const fn cardinality(self) -> usize {
        match self {
            Self::X => 1,
            Self::L | Self::T => 4,
            Self::I | Self::Diagonal => 2,
        }
    }

    /// Instance reached from `i` by a quarter-turn rotation
    pub const fn rotate(self, i: usize) -> usize {
        match self {
            Self::X => 0,
            Self::L | Self::T => (i + 1) % 4,
            Self::I | Self::Diagonal => 1 - (i % 2),
        }
    }

    /// Instance reached from `i` by a horizontal reflection
    pub const fn reflect(self, i: usize) -> usize {
        match self {
            Self::X | Self::I => i,
            Self::L => {
                if i % 2 == 0 { i + 1 } else { i - 1 }
            }
            Self::T => {
                if i % 2 == 0 { i } else { 4 - i }
            }
            Self::Diagonal => 1 - (i % 2),
        }
    }
}

/// One tile declaration in a catalog
#[derive(Clone, Debug)]
pub struct TileDecl {
    /// Tile name, also the stem of its bitmap file
    pub name: String,
    /// Symmetry class generating the tile's orientation instances
    pub symmetry: TileSymmetry,
    /// Weight shared by every instance of the tile
    pub weight: f64,
}

/// One declared adjacency: `right` may sit to the right of `left`
#[derive(Clone, Debug)]
pub struct NeighborDecl {
    /// Left tile as (name, orientation instance)
    pub left: (String, usize),
    /// Right tile as (name, orientation instance)
    pub right: (String, usize),
}

/// A full tile catalog as handed over by the external catalog loader
#[derive(Clone, Debug)]
pub struct TileCatalog {
    /// Side length of every tile bitmap in pixels
    pub tile_size: usize,
    /// Whether each orientation instance has its own bitmap on disk
    pub unique: bool,
    /// Declared tiles
    pub tiles: Vec<TileDecl>,
    /// Declared adjacencies
    pub neighbors: Vec<NeighborDecl>,
    /// Named tile subsets a job may select
    pub subsets: BTreeMap<String, Vec<String>>,
}

/// Pixel content of one tile orientation, `tile_size * tile_size` RGBA values
pub type TileBitmap = Vec<Rgba>;

/// Callback resolving a tile name to its pixel content
pub type TileLoader<'a> = dyn Fn(&str) -> Result<TileBitmap> + 'a;

/// Rotate a square tile bitmap a quarter turn
fn rotate_bitmap(tile: &TileBitmap, size: usize) -> TileBitmap {
    let mut result = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let pixel = tile
                .get((size - 1 - y) + size * x)
                .copied()
                .unwrap_or(UNDECIDED_COLOR);
            result.push(pixel);
        }
    }
    result
}

/// Model whose propagation rule comes from declared tile adjacency
pub struct TileModel {
    width: usize,
    height: usize,
    periodic_out: bool,
    tile_size: usize,
    tiles: Vec<TileBitmap>,
    weights: Vec<f64>,
    // 4 x num_patterns x num_patterns
    propagator: Array3<bool>,
}

impl TileModel {
    /// Build the model from a catalog, instantiating tile orientations and
    /// expanding declared adjacencies through the symmetry action maps
    ///
    /// `subset` restricts instantiation to the tiles a named catalog subset
    /// lists. Bitmaps come through `loader`; in `unique` catalogs each
    /// instance loads its own bitmap ("`name` `k`"), otherwise derived
    /// instances are rotations of the base bitmap.
    ///
    /// # Errors
    ///
    /// Returns an error if the subset or a referenced tile is unknown, an
    /// orientation index is out of range, a bitmap has the wrong size, or
    /// the catalog instantiates no tiles.
    pub fn new(
        catalog: &TileCatalog,
        subset: Option<&str>,
        width: usize,
        height: usize,
        periodic_out: bool,
        loader: &TileLoader<'_>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(invalid_parameter(
                "width/height",
                &format!("{width}x{height}"),
                &"output dimensions must be positive",
            ));
        }

        let allowed: Option<&Vec<String>> = match subset {
            Some(name) => Some(catalog.subsets.get(name).ok_or_else(|| {
                invalid_parameter("subset", &name, &"catalog declares no such subset")
            })?),
            None => None,
        };

        let mut tiles: Vec<TileBitmap> = Vec::new();
        let mut weights = Vec::new();
        // Per instance: where each of the 8 dihedral actions lands
        let mut action: Vec<[usize; 8]> = Vec::new();
        let mut first_instance: BTreeMap<&str, (usize, TileSymmetry)> = BTreeMap::new();

        for decl in &catalog.tiles {
            if let Some(names) = allowed {
                if !names.iter().any(|n| n == &decl.name) {
                    continue;
                }
            }

            let sym = decl.symmetry;
            let base = action.len();
            first_instance.insert(decl.name.as_str(), (base, sym));

            for i in 0..sym.cardinality() {
                let r1 = sym.rotate(i);
                let r2 = sym.rotate(r1);
                let r3 = sym.rotate(r2);
                let map = [
                    base + i,
                    base + r1,
                    base + r2,
                    base + r3,
                    base + sym.reflect(i),
                    base + sym.reflect(r1),
                    base + sym.reflect(r2),
                    base + sym.reflect(r3),
                ];
                action.push(map);
                weights.push(decl.weight);
            }

            if catalog.unique {
                for i in 0..sym.cardinality() {
                    let bitmap = loader(&format!("{} {i}", decl.name))?;
                    Self::check_bitmap(&bitmap, catalog.tile_size, &decl.name)?;
                    tiles.push(bitmap);
                }
            } else {
                let bitmap = loader(&decl.name)?;
                Self::check_bitmap(&bitmap, catalog.tile_size, &decl.name)?;
                tiles.push(bitmap);
                for i in 1..sym.cardinality() {
                    let previous = tiles.get(base + i - 1).cloned().unwrap_or_default();
                    tiles.push(rotate_bitmap(&previous, catalog.tile_size));
                }
            }
        }

        let num_patterns = action.len();
        if num_patterns == 0 {
            return Err(invalid_sample(&"tile catalog instantiates no tiles"));
        }

        let mut propagator = Array3::from_elem((4, num_patterns, num_patterns), false);

        let resolve = |reference: &(String, usize)| -> Result<usize> {
            let (base, sym) =
                first_instance
                    .get(reference.0.as_str())
                    .copied()
                    .ok_or_else(|| WfcError::MissingTile {
                        name: reference.0.clone(),
                    })?;
            if reference.1 >= sym.cardinality() {
                return Err(invalid_parameter(
                    "orientation",
                    &reference.1,
                    &format!("tile '{}' has {} orientations", reference.0, sym.cardinality()),
                ));
            }
            Ok(base + reference.1)
        };

        let act = |t: usize, s: usize| -> usize {
            action.get(t).and_then(|map| map.get(s)).copied().unwrap_or(t)
        };

        for neighbor in &catalog.neighbors {
            let left = resolve(&neighbor.left)?;
            let right = resolve(&neighbor.right)?;
            let down = act(left, 1);
            let up = act(right, 1);

            let mut allow = |d: usize, t1: usize, t2: usize| {
                if let Some(slot) = propagator.get_mut((d, t1, t2)) {
                    *slot = true;
                }
            };

            // A declared horizontal pair implies its reflections and the
            // quarter-turned vertical pair with theirs
            allow(0, left, right);
            allow(0, act(left, 6), act(right, 6));
            allow(0, act(right, 4), act(left, 4));
            allow(0, act(right, 2), act(left, 2));

            allow(1, down, up);
            allow(1, act(up, 6), act(down, 6));
            allow(1, act(down, 4), act(up, 4));
            allow(1, act(up, 2), act(down, 2));
        }

        // The +x and -y relations are transposes of the -x and +y ones
        for t1 in 0..num_patterns {
            for t2 in 0..num_patterns {
                let left_right = propagator.get((0, t2, t1)).copied().unwrap_or(false);
                let down_up = propagator.get((1, t2, t1)).copied().unwrap_or(false);
                if let Some(slot) = propagator.get_mut((2, t1, t2)) {
                    *slot = left_right;
                }
                if let Some(slot) = propagator.get_mut((3, t1, t2)) {
                    *slot = down_up;
                }
            }
        }

        Ok(Self {
            width,
            height,
            periodic_out,
            tile_size: catalog.tile_size,
            tiles,
            weights,
            propagator,
        })
    }

    fn check_bitmap(bitmap: &TileBitmap, tile_size: usize, name: &str) -> Result<()> {
        if bitmap.len() == tile_size * tile_size {
            Ok(())
        } else {
            Err(invalid_sample(&format!(
                "tile '{name}' has {} pixels, expected {}x{tile_size}",
                bitmap.len(),
                tile_size
            )))
        }
    }

    /// Whether instance `t2` may sit adjacent to `t1` in direction `d`
    ///
    /// Directions index the cardinal offsets -x, +y, +x, -y in that order.
    pub fn allowed(&self, d: usize, t1: usize, t2: usize) -> bool {
        self.propagator.get((d, t1, t2)).copied().unwrap_or(false)
    }

    /// Side length of every tile bitmap in pixels
    pub const fn tile_size(&self) -> usize {
        self.tile_size
    }
}

impl Model for TileModel {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn num_patterns(&self) -> usize {
        self.weights.len()
    }

    fn periodic_out(&self) -> bool {
        self.periodic_out
    }

    fn pattern_weight(&self, t: usize) -> f64 {
        self.weights.get(t).copied().unwrap_or(0.0)
    }

    fn on_boundary(&self, _x: usize, _y: usize) -> bool {
        false
    }

    fn propagate(&self, output: &mut Output) -> bool {
        let mut did_change = false;
        let (width, height) = (self.width as isize, self.height as isize);
        let num_patterns = self.weights.len();

        // Snapshot the work list; a dirty flag must stay readable for all
        // four directions before it is consumed
        let pending = output.changes.clone();
        for x in 0..self.width {
            for y in 0..self.height {
                if pending.get(x, y) {
                    output.changes.clear(x, y);
                }
            }
        }

        for x2 in 0..self.width {
            for y2 in 0..self.height {
                for (d, (dx, dy)) in DIRECTIONS.iter().enumerate() {
                    let mut x1 = x2 as isize + dx;
                    let mut y1 = y2 as isize + dy;

                    if x1 < 0 || x1 >= width || y1 < 0 || y1 >= height {
                        if !self.periodic_out {
                            continue;
                        }
                        x1 = x1.rem_euclid(width);
                        y1 = y1.rem_euclid(height);
                    }

                    let (x1, y1) = (x1 as usize, y1 as usize);
                    if !pending.get(x1, y1) {
                        continue;
                    }

                    for t2 in 0..num_patterns {
                        if !output.wave.get(x2, y2, t2) {
                            continue;
                        }

                        let supported = (0..num_patterns).any(|t1| {
                            output.wave.get(x1, y1, t1) && self.allowed(d, t1, t2)
                        });

                        if !supported {
                            output.wave.ban(x2, y2, t2);
                            output.changes.set(x2, y2);
                            did_change = true;
                        }
                    }
                }
            }
        }

        did_change
    }

    fn image(&self, output: &Output) -> RgbaImage {
        let ts = self.tile_size;
        let mut img = RgbaImage::new((self.width * ts) as u32, (self.height * ts) as u32);

        for y in 0..self.height {
            for x in 0..self.width {
                let frozen = output.wave.frozen_pattern(x, y);
                for py in 0..ts {
                    for px in 0..ts {
                        let color = frozen
                            .and_then(|t| self.tiles.get(t))
                            .and_then(|tile| tile.get(py * ts + px))
                            .copied()
                            .unwrap_or(UNDECIDED_COLOR);
                        img.put_pixel(
                            (x * ts + px) as u32,
                            (y * ts + py) as u32,
                            ImageRgba(color),
                        );
                    }
                }
            }
        }

        img
    }
}
