//! Tile types and grid partitioning.
//!
//! A full image is split into [`TileDescriptor`]s by [`partition`]. Each
//! descriptor is fetched once and comes back as a [`TileResult`].

mod descriptor;
mod grid;
mod result;

pub use descriptor::TileDescriptor;
pub use grid::{partition, tile_count};
pub use result::TileResult;
