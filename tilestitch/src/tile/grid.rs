//! Grid partitioning.
//!
//! Splits an image of `width × height` pixels into a row-major grid of
//! `tile_size × tile_size` squares. The last column and the last row are
//! clipped so the grid ends exactly on the image edges.

use crate::error::{StitchError, StitchResult};
use crate::tile::TileDescriptor;

/// Partitions an image into tiles, row-major from the top-left.
///
/// Every pixel of `[0, width) × [0, height)` is covered by exactly one
/// returned tile. Tiles in the last column have width
/// `width - tile_size * (columns - 1)`, tiles in the last row have height
/// `height - tile_size * (rows - 1)`; when a dimension is an exact multiple
/// of `tile_size` that clip equals `tile_size`.
///
/// The ordering is stable for identical inputs but only matters for
/// progress logging.
///
/// # Errors
///
/// Returns [`StitchError::InvalidInput`] if any argument is zero.
///
/// # Example
///
/// ```
/// use tilestitch::tile::{partition, TileDescriptor};
///
/// let tiles = partition(512, 300, 256).unwrap();
/// assert_eq!(tiles.len(), 4);
/// assert_eq!(tiles[3], TileDescriptor::new(256, 256, 256, 44));
/// ```
pub fn partition(width: u32, height: u32, tile_size: u32) -> StitchResult<Vec<TileDescriptor>> {
    if width == 0 || height == 0 {
        return Err(StitchError::InvalidInput(format!(
            "image dimensions must be positive, got {}x{}",
            width, height
        )));
    }
    if tile_size == 0 {
        return Err(StitchError::InvalidInput(
            "tile size must be positive".to_string(),
        ));
    }

    let columns = width.div_ceil(tile_size);
    let rows = height.div_ceil(tile_size);
    let last_width = width - tile_size * (columns - 1);
    let last_height = height - tile_size * (rows - 1);

    let mut tiles = Vec::with_capacity(columns as usize * rows as usize);
    for row in 0..rows {
        let tile_height = if row == rows - 1 {
            last_height
        } else {
            tile_size
        };
        for col in 0..columns {
            let tile_width = if col == columns - 1 {
                last_width
            } else {
                tile_size
            };
            tiles.push(TileDescriptor::new(
                col * tile_size,
                row * tile_size,
                tile_width,
                tile_height,
            ));
        }
    }

    Ok(tiles)
}

/// Number of tiles [`partition`] returns for the given inputs.
///
/// Returns 0 if any argument is zero.
pub fn tile_count(width: u32, height: u32, tile_size: u32) -> usize {
    if width == 0 || height == 0 || tile_size == 0 {
        return 0;
    }
    width.div_ceil(tile_size) as usize * height.div_ceil(tile_size) as usize
}
