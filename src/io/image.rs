//! Image decoding into paletted grids and PNG export with upscaling

use crate::io::error::{Result, WfcError, invalid_sample};
use crate::model::pattern::{ColorIndex, MAX_COLORS, PalettedImage, Rgba};
use crate::model::tiled::TileBitmap;
use image::imageops::FilterType;
use image::{RgbaImage, imageops};
use std::collections::HashMap;
use std::path::Path;

fn open_rgba(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|e| WfcError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(img.to_rgba8())
}

/// Load an exemplar image and index its pixels into an ordered palette
///
/// Palette entries are sorted by channel value, so index assignment (and
/// every pattern hash derived from it) is deterministic for a given image.
///
/// # Errors
///
/// Returns an error if the file cannot be decoded or it uses more distinct
/// colors than a [`ColorIndex`] can address.
pub fn load_paletted_image(path: &Path) -> Result<PalettedImage> {
    let rgba = open_rgba(path)?;
    let (width, height) = (rgba.width() as usize, rgba.height() as usize);

    let mut palette: Vec<Rgba> = rgba.pixels().map(|p| p.0).collect::<Vec<_>>();
    palette.sort_unstable();
    palette.dedup();

    if palette.len() > MAX_COLORS {
        return Err(invalid_sample(&format!(
            "'{}' has {} distinct colors, the palette holds at most {MAX_COLORS}",
            path.display(),
            palette.len()
        )));
    }

    let index_of: HashMap<Rgba, ColorIndex> = palette
        .iter()
        .enumerate()
        .map(|(i, &color)| (color, i as ColorIndex))
        .collect();

    let data = rgba
        .pixels()
        .map(|p| index_of.get(&p.0).copied().unwrap_or(0))
        .collect();

    Ok(PalettedImage {
        width,
        height,
        data,
        palette,
    })
}

/// Load one tile bitmap and validate its dimensions
///
/// # Errors
///
/// Returns an error if the file cannot be decoded or is not exactly
/// `tile_size` pixels square.
pub fn load_tile_bitmap(path: &Path, tile_size: usize) -> Result<TileBitmap> {
    let rgba = open_rgba(path)?;
    if rgba.width() as usize != tile_size || rgba.height() as usize != tile_size {
        return Err(invalid_sample(&format!(
            "'{}' is {}x{}, the catalog declares {tile_size}x{tile_size} tiles",
            path.display(),
            rgba.width(),
            rgba.height()
        )));
    }
    Ok(rgba.pixels().map(|p| p.0).collect())
}

/// Upscale an image by an integer factor with nearest-neighbor sampling
#[must_use]
pub fn upscale(image: &RgbaImage, factor: u32) -> RgbaImage {
    if factor <= 1 {
        return image.clone();
    }
    imageops::resize(
        image,
        image.width() * factor,
        image.height() * factor,
        FilterType::Nearest,
    )
}

/// Save an image as PNG, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the image
/// cannot be encoded and written.
pub fn export_png(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| WfcError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    image.save(path).map_err(|e| WfcError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}
