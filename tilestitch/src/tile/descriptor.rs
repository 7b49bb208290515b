//! Tile descriptor type.
//!
//! A `TileDescriptor` names one rectangular region of the source image in
//! pixel coordinates. Descriptors are produced by [`partition`](super::partition)
//! and never change afterwards.

use std::fmt;

/// One rectangular region of the full image.
///
/// # Example
///
/// ```
/// use tilestitch::tile::TileDescriptor;
///
/// let tile = TileDescriptor::new(256, 0, 44, 256);
/// assert_eq!(tile.x(), 256);
/// assert_eq!(tile.right(), 300);
/// assert_eq!(tile.bottom(), 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileDescriptor {
    /// Left edge in source-image pixels
    x: u32,
    /// Top edge in source-image pixels
    y: u32,
    /// Width in pixels (never zero for partitioned tiles)
    width: u32,
    /// Height in pixels (never zero for partitioned tiles)
    height: u32,
}

impl TileDescriptor {
    /// Create a new tile descriptor.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the left edge.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Get the top edge.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Get the tile width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the tile height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Number of pixels covered.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for TileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}
