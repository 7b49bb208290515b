//! Resource identifier and output encoding.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;

use crate::error::{StitchError, StitchResult};

/// Validated base identifier of a remote tiled image.
///
/// Looks like `https://www.artic.edu/iiif/2/831a05de-d3f6-f4fa-a460-23008dd58dda`.
/// Trailing slashes are dropped so paths can be appended directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    base: String,
}

impl ResourceId {
    /// Parses and validates a resource identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidInput`] if the value is not an absolute
    /// http(s) URL with a host, or carries a query string or fragment that
    /// appended path segments would end up inside.
    pub fn parse(raw: &str) -> StitchResult<Self> {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(StitchError::InvalidInput(
                "resource identifier is empty".to_string(),
            ));
        }

        let url = Url::parse(trimmed).map_err(|e| {
            StitchError::InvalidInput(format!("resource identifier '{}': {}", raw, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(StitchError::InvalidInput(format!(
                "resource identifier '{}' must use http or https",
                raw
            )));
        }
        if url.host_str().is_none() {
            return Err(StitchError::InvalidInput(format!(
                "resource identifier '{}' has no host",
                raw
            )));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(StitchError::InvalidInput(format!(
                "resource identifier '{}' must not contain a query or fragment",
                raw
            )));
        }

        Ok(Self {
            base: trimmed.to_string(),
        })
    }

    /// The normalized base, without trailing slash.
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Address of the image information document.
    pub fn info_url(&self) -> String {
        format!("{}/info.json", self.base)
    }

    /// Last path segment, used to name the output file.
    pub fn name(&self) -> &str {
        self.base.rsplit('/').next().unwrap_or(&self.base)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

impl FromStr for ResourceId {
    type Err = StitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Encoding requested from the server for every tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// JPEG (`default.jpg`)
    #[default]
    Jpg,
    /// PNG (`default.png`)
    Png,
}

impl ImageFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = StitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ImageFormat::Jpg),
            "png" => Ok(ImageFormat::Png),
            other => Err(StitchError::InvalidInput(format!(
                "unsupported image format '{}', expected jpg or png",
                other
            ))),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
