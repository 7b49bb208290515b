//! Image information discovery.
//!
//! Reads the `info.json` document an image server publishes next to every
//! tiled resource to learn the full image dimensions.

use serde::Deserialize;
use tracing::info;

use super::AsyncHttpClient;
use crate::error::{StitchError, StitchResult};
use crate::locator::ResourceId;

/// Dimensions and capabilities of a remote image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Full image width in pixels.
    pub width: u32,
    /// Full image height in pixels.
    pub height: u32,
    /// Extra output formats advertised by the server, if any.
    pub formats: Vec<String>,
}

#[derive(Deserialize)]
struct InfoDocument {
    width: u32,
    height: u32,
    #[serde(default)]
    profile: serde_json::Value,
    #[serde(rename = "extraFormats", default)]
    extra_formats: Vec<String>,
}

impl ImageInfo {
    /// Parses an `info.json` document.
    pub fn from_json(data: &[u8]) -> StitchResult<Self> {
        let doc: InfoDocument = serde_json::from_slice(data)
            .map_err(|e| StitchError::Metadata(format!("invalid info.json: {}", e)))?;

        // Version 2 lists a compliance URI followed by optional objects.
        // Version 3 uses a bare level string plus `extraFormats`.
        let profile_entries = match &doc.profile {
            serde_json::Value::Array(entries) => entries.as_slice(),
            _ => &[],
        };
        let mut formats: Vec<String> = profile_entries
            .iter()
            .filter_map(|entry| entry.get("formats"))
            .filter_map(|formats| formats.as_array())
            .flatten()
            .filter_map(|format| format.as_str().map(str::to_string))
            .collect();
        for format in doc.extra_formats {
            if !formats.contains(&format) {
                formats.push(format);
            }
        }

        Ok(Self {
            width: doc.width,
            height: doc.height,
            formats,
        })
    }
}

/// Fetches and parses `{base}/info.json`.
///
/// This is a one-shot call made before a run starts, so a non-success status
/// is reported as an error instead of being retried.
pub async fn fetch_image_info<C: AsyncHttpClient>(
    client: &C,
    resource: &ResourceId,
) -> StitchResult<ImageInfo> {
    let url = resource.info_url();
    let response = client.get(&url).await?;
    if !response.is_success() {
        return Err(StitchError::Metadata(format!(
            "HTTP {} from {}",
            response.status, url
        )));
    }

    let image_info = ImageInfo::from_json(&response.body)?;
    info!(
        width = image_info.width,
        height = image_info.height,
        formats = ?image_info.formats,
        "Image information retrieved"
    );
    Ok(image_info)
}
