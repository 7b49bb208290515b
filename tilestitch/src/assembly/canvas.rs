//! Output canvas.

use image::{imageops, RgbImage};
use tracing::warn;

use crate::error::{StitchError, StitchResult};
use crate::tile::TileResult;

/// RGB pixel buffer the tiles are painted onto.
///
/// Starts black. Only the reassembly sink writes to it.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    /// Creates a black canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Decodes a tile body and paints it at the tile's offset.
    ///
    /// A decoded block larger than its descriptor is cropped to the
    /// descriptor; a smaller one is painted as-is and the rest of the region
    /// stays black.
    pub fn paint(&mut self, result: &TileResult) -> StitchResult<()> {
        let tile = result.tile;
        let decoded = decode_tile(&result.bytes).map_err(|reason| StitchError::Decode {
            x: tile.x(),
            y: tile.y(),
            reason,
        })?;

        if decoded.width() != tile.width() || decoded.height() != tile.height() {
            warn!(
                x = tile.x(),
                y = tile.y(),
                expected_width = tile.width(),
                expected_height = tile.height(),
                actual_width = decoded.width(),
                actual_height = decoded.height(),
                "Tile size differs from requested region"
            );
        }

        let width = decoded.width().min(tile.width());
        let height = decoded.height().min(tile.height());
        let block = imageops::crop_imm(&decoded, 0, 0, width, height).to_image();
        imageops::replace(
            &mut self.image,
            &block,
            i64::from(tile.x()),
            i64::from(tile.y()),
        );
        Ok(())
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    /// Consumes the canvas, returning the finished image.
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

fn decode_tile(bytes: &[u8]) -> Result<RgbImage, String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("image decode error: {}", e))?;
    Ok(img.to_rgb8())
}
