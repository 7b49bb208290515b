//! Saving the stitched image.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use tilestitch::locator::{ImageFormat, ResourceId};
use tracing::info;

use crate::error::CliError;

/// Picks where the image goes.
///
/// An explicit path wins and has its extension replaced to match `format`.
/// Otherwise the file is named after the last segment of the resource, with
/// the format extension appended, and placed in `directory`. Identifiers may
/// contain dots of their own.
pub fn resolve_output_path(
    explicit: Option<&Path>,
    directory: &Path,
    resource: &ResourceId,
    format: ImageFormat,
) -> PathBuf {
    match explicit {
        Some(path) => path.with_extension(format.extension()),
        None => directory.join(format!("{}.{}", resource.name(), format.extension())),
    }
}

/// Writes `image` to `path`, creating parent directories as needed.
pub fn persist(image: &RgbImage, path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|error| CliError::CreateDir {
            path: parent.to_path_buf(),
            error,
        })?;
    }

    image.save(path).map_err(|error| CliError::FileWrite {
        path: path.to_path_buf(),
        error,
    })?;

    info!(path = %path.display(), "Saved stitched image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn resource() -> ResourceId {
        ResourceId::parse("https://www.artic.edu/iiif/2/831a05de-d3f6").unwrap()
    }

    #[test]
    fn test_default_name_from_resource() {
        let path = resolve_output_path(None, Path::new("output"), &resource(), ImageFormat::Jpg);
        assert_eq!(path, PathBuf::from("output/831a05de-d3f6.jpg"));
    }

    #[test]
    fn test_default_name_keeps_dots_in_identifier() {
        let resource = ResourceId::parse("https://example.org/iiif/2/scan.v1").unwrap();
        let path = resolve_output_path(None, Path::new("output"), &resource, ImageFormat::Jpg);
        assert_eq!(path, PathBuf::from("output/scan.v1.jpg"));
    }

    #[test]
    fn test_explicit_path_extension_is_forced() {
        let path = resolve_output_path(
            Some(Path::new("/tmp/picture.jpg")),
            Path::new("output"),
            &resource(),
            ImageFormat::Png,
        );
        assert_eq!(path, PathBuf::from("/tmp/picture.png"));

        let path = resolve_output_path(
            Some(Path::new("picture")),
            Path::new("output"),
            &resource(),
            ImageFormat::Jpg,
        );
        assert_eq!(path, PathBuf::from("picture.jpg"));
    }

    #[test]
    fn test_persist_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.png");
        let image = RgbImage::from_pixel(4, 3, Rgb([10, 20, 30]));

        persist(&image, &path).unwrap();

        let saved = image::open(&path).unwrap().to_rgb8();
        assert_eq!(saved, image);
    }

    #[test]
    fn test_persist_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");

        persist(&RgbImage::new(16, 16), &path).unwrap();

        assert_eq!(image::open(&path).unwrap().width(), 16);
    }
}
