//! TileStitch - tiled image download and reassembly
//!
//! Downloads a large image from a IIIF image server as a grid of tiles,
//! fetched concurrently by a small pool of workers, and paints them back
//! together into a single picture. Servers that throttle are waited out:
//! a refused tile is retried after a fixed delay until it succeeds.
//!
//! # Example
//!
//! ```ignore
//! use tilestitch::config::StitchConfig;
//! use tilestitch::coordinator::{RunCoordinator, StitchRequest};
//! use tilestitch::locator::ResourceId;
//! use tilestitch::provider::ReqwestClientFactory;
//! use tokio_util::sync::CancellationToken;
//!
//! let resource = ResourceId::parse("https://example.org/iiif/2/abc")?;
//! let coordinator = RunCoordinator::new(StitchConfig::default(), ReqwestClientFactory::default());
//! let outcome = coordinator
//!     .run(StitchRequest::new(resource, 4000, 3000), CancellationToken::new())
//!     .await?;
//! outcome.canvas.into_image().save("abc.jpg")?;
//! ```

pub mod assembly;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod locator;
pub mod logging;
pub mod provider;
pub mod tile;

pub use error::{StitchError, StitchResult};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
