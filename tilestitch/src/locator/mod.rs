//! Tile address construction.
//!
//! Builds the image-API address of one tile:
//!
//! ```text
//! {base}/{x},{y},{w},{h}/{w},/0/default.{ext}
//! ```
//!
//! The second segment requests an output width equal to the region width so
//! the server never rescales. Rotation is always `0` and quality `default`.

mod resource;

pub use resource::{ImageFormat, ResourceId};

use std::fmt;

use crate::tile::TileDescriptor;

/// Rotation segment sent with every tile request.
const ROTATION: &str = "0";

/// Quality segment sent with every tile request.
const QUALITY: &str = "default";

/// Fully-qualified address of one tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchAddress(String);

impl FetchAddress {
    /// The address as a URL string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FetchAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps tile descriptors to fetch addresses for one resource.
///
/// Pure and deterministic; construction is the only place a malformed base
/// can be rejected, which [`ResourceId::parse`] already did.
#[derive(Debug, Clone)]
pub struct TileLocator {
    base: ResourceId,
    format: ImageFormat,
}

impl TileLocator {
    /// Creates a locator for the given resource and output encoding.
    pub fn new(base: ResourceId, format: ImageFormat) -> Self {
        Self { base, format }
    }

    /// The resource this locator addresses.
    pub fn base(&self) -> &ResourceId {
        &self.base
    }

    /// Encoding requested for every tile.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Builds the address for one tile.
    pub fn locate(&self, tile: &TileDescriptor) -> FetchAddress {
        FetchAddress(format!(
            "{}/{}/{},/{}/{}.{}",
            self.base.as_str(),
            tile,
            tile.width(),
            ROTATION,
            QUALITY,
            self.format.extension()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.artic.edu/iiif/2/831a05de-d3f6-f4fa-a460-23008dd58dda";

    fn locator(format: ImageFormat) -> TileLocator {
        TileLocator::new(ResourceId::parse(BASE).unwrap(), format)
    }

    #[test]
    fn test_locate_full_tile() {
        let address = locator(ImageFormat::Jpg).locate(&TileDescriptor::new(0, 0, 256, 256));
        assert_eq!(address.as_str(), format!("{}/0,0,256,256/256,/0/default.jpg", BASE));
    }

    #[test]
    fn test_locate_clipped_tile_requests_native_width() {
        let address = locator(ImageFormat::Jpg).locate(&TileDescriptor::new(10752, 0, 65, 256));
        assert_eq!(
            address.to_string(),
            format!("{}/10752,0,65,256/65,/0/default.jpg", BASE)
        );
    }

    #[test]
    fn test_locate_png() {
        let address = locator(ImageFormat::Png).locate(&TileDescriptor::new(256, 256, 256, 44));
        assert!(address.as_str().ends_with("/256,256,256,44/256,/0/default.png"));
    }

    #[test]
    fn test_locate_is_deterministic() {
        let locator = locator(ImageFormat::Jpg);
        let tile = TileDescriptor::new(512, 256, 256, 256);
        assert_eq!(locator.locate(&tile), locator.locate(&tile));
    }
}
