//! Fetched tile payload.

use super::TileDescriptor;

/// Encoded image bytes for one tile, ready to be painted.
///
/// Produced exactly once per descriptor by a fetch worker after a successful
/// response, and consumed exactly once by the reassembly sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileResult {
    /// Region this payload was fetched for.
    pub tile: TileDescriptor,
    /// Raw encoded image bytes as returned by the server.
    pub bytes: Vec<u8>,
}

impl TileResult {
    /// Creates a result for the given tile.
    pub fn new(tile: TileDescriptor, bytes: Vec<u8>) -> Self {
        Self { tile, bytes }
    }

    /// Left edge of the destination region.
    pub fn x(&self) -> u32 {
        self.tile.x()
    }

    /// Top edge of the destination region.
    pub fn y(&self) -> u32 {
        self.tile.y()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_comes_from_descriptor() {
        let result = TileResult::new(TileDescriptor::new(256, 512, 44, 256), vec![0xFF, 0xD8]);
        assert_eq!(result.x(), 256);
        assert_eq!(result.y(), 512);
        assert_eq!(result.bytes.len(), 2);
    }
}
