//! HTTP access to a tiled-image server.
//!
//! This module provides the transport abstraction used by fetch workers and
//! by image metadata discovery:
//!
//! ```ignore
//! use tilestitch::provider::{AsyncHttpClient, AsyncReqwestClient};
//!
//! let client = AsyncReqwestClient::with_timeout(30)?;
//! let response = client.get("https://example.org/iiif/2/abc/info.json").await?;
//! if response.is_success() {
//!     println!("{} bytes", response.body.len());
//! }
//! ```

mod http;
mod info;
mod types;

pub use http::{
    AsyncHttpClient, AsyncReqwestClient, HttpClientFactory, HttpResponse, ReqwestClientFactory,
};
pub use info::{fetch_image_info, ImageInfo};
pub use types::ProviderError;

#[cfg(test)]
pub use http::tests::{MockAsyncHttpClient, MockClientFactory};
