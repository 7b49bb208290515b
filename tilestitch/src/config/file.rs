//! INI configuration file.
//!
//! ```ini
//! [download]
//! workers = 2
//! tile_size = 256
//! request_delay_ms = 100
//! retry_delay_secs = 180
//! max_attempts = 20
//! timeout = 30
//! shared_backoff = false
//!
//! [output]
//! format = jpg
//! directory = output
//! ```
//!
//! Every key is optional. A missing file yields the defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use super::{
    DEFAULT_REQUEST_DELAY_MS, DEFAULT_TILE_SIZE, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKER_COUNT,
};
use crate::fetch::DEFAULT_RETRY_DELAY_SECS;
use crate::locator::ImageFormat;

/// Default output directory for stitched images.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Errors that can occur while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file exists but could not be read or parsed.
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// A key had a value that could not be used.
    #[error("Invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    pub workers: usize,
    pub tile_size: u32,
    pub request_delay_ms: u64,
    pub retry_delay_secs: u64,
    pub max_attempts: Option<u32>,
    pub timeout: u64,
    pub shared_backoff: bool,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKER_COUNT,
            tile_size: DEFAULT_TILE_SIZE,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            max_attempts: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            shared_backoff: false,
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub format: ImageFormat,
    pub directory: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: ImageFormat::default(),
            directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub download: DownloadSettings,
    pub output: OutputSettings,
}

/// Default location: `<config dir>/tilestitch/config.ini`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tilestitch").join("config.ini"))
}

impl ConfigFile {
    /// Loads the file at `path`, or returns defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigFileError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        parse_ini(&ini)
    }

    /// Loads from the default location, if there is one.
    pub fn load_default() -> Result<Self, ConfigFileError> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parses configuration from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigFileError::Read {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        parse_ini(&ini)
    }
}

fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("download")) {
        let download = &mut config.download;
        if let Some(v) = section.get("workers") {
            download.workers = parse_positive("download", "workers", v)?;
        }
        if let Some(v) = section.get("tile_size") {
            download.tile_size = parse_positive("download", "tile_size", v)?;
        }
        if let Some(v) = section.get("request_delay_ms") {
            download.request_delay_ms =
                parse_value("download", "request_delay_ms", v, "expected milliseconds")?;
        }
        if let Some(v) = section.get("retry_delay_secs") {
            download.retry_delay_secs = parse_positive("download", "retry_delay_secs", v)?;
        }
        if let Some(v) = section.get("max_attempts") {
            let v = v.trim();
            // Empty means unbounded
            if !v.is_empty() {
                download.max_attempts = Some(parse_positive("download", "max_attempts", v)?);
            }
        }
        if let Some(v) = section.get("timeout") {
            download.timeout = parse_positive("download", "timeout", v)?;
        }
        if let Some(v) = section.get("shared_backoff") {
            download.shared_backoff = parse_bool("download", "shared_backoff", v)?;
        }
    }

    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = section.get("format") {
            config.output.format =
                v.parse().map_err(|_| invalid("output", "format", v, "must be jpg or png"))?;
        }
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.output.directory = PathBuf::from(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialEq + Default,
{
    let parsed: T = parse_value(section, key, value, "must be a positive integer")?;
    if parsed == T::default() {
        return Err(invalid(section, key, value, "must be a positive integer"));
    }
    Ok(parsed)
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigFile::load(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(
            &path,
            "[download]\nworkers = 4\ntile_size = 512\nrequest_delay_ms = 250\n\
             retry_delay_secs = 60\nmax_attempts = 12\ntimeout = 10\nshared_backoff = yes\n\
             [output]\nformat = png\ndirectory = /tmp/stitched\n",
        )
        .unwrap();

        let config = ConfigFile::load(&path).unwrap();

        assert_eq!(config.download.workers, 4);
        assert_eq!(config.download.tile_size, 512);
        assert_eq!(config.download.request_delay_ms, 250);
        assert_eq!(config.download.retry_delay_secs, 60);
        assert_eq!(config.download.max_attempts, Some(12));
        assert_eq!(config.download.timeout, 10);
        assert!(config.download.shared_backoff);
        assert_eq!(config.output.format, ImageFormat::Png);
        assert_eq!(config.output.directory, PathBuf::from("/tmp/stitched"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ConfigFile::from_ini_str("[download]\nworkers = 3\n").unwrap();
        assert_eq!(config.download.workers, 3);
        assert_eq!(config.download.tile_size, DEFAULT_TILE_SIZE);
        assert_eq!(config.output, OutputSettings::default());
    }

    #[test]
    fn test_empty_max_attempts_is_unbounded() {
        let config = ConfigFile::from_ini_str("[download]\nmax_attempts =\n").unwrap();
        assert_eq!(config.download.max_attempts, None);
    }

    #[test]
    fn test_invalid_values() {
        let err = ConfigFile::from_ini_str("[download]\nworkers = 0\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "workers"));

        let err = ConfigFile::from_ini_str("[download]\nretry_delay_secs = 0\n").unwrap_err();
        assert!(
            matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "retry_delay_secs")
        );

        let err = ConfigFile::from_ini_str("[download]\ntimeout = soon\n").unwrap_err();
        assert!(err.to_string().contains("[download] timeout"));

        let err = ConfigFile::from_ini_str("[output]\nformat = gif\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "format"));

        let err = ConfigFile::from_ini_str("[download]\nshared_backoff = maybe\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { .. }));
    }
}
