//! Run configuration.
//!
//! `StitchConfig` holds every tunable of a stitching run. Defaults match the
//! behaviour image servers tolerate in practice: two workers, a short pause
//! before each request and a long fixed pause after a refusal.
//!
//! Values can be overlaid from an INI file via [`ConfigFile`].

mod file;

pub use file::{default_config_path, ConfigFile, ConfigFileError, DownloadSettings, OutputSettings};

use std::time::Duration;

use crate::error::{StitchError, StitchResult};
use crate::fetch::RetryPolicy;
use crate::locator::ImageFormat;

/// Edge length of a full-size square tile, in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Number of concurrent fetch workers.
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Pause before each queue pop, in milliseconds.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 100;

/// Consecutive transport faults on one tile before its worker gives up.
pub const DEFAULT_TRANSPORT_FAILURE_LIMIT: u32 = 3;

/// Completed tiles between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// HTTP request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How long shutdown waits for workers before aborting them, in seconds.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Configuration for one stitching run.
#[derive(Clone, Debug, PartialEq)]
pub struct StitchConfig {
    /// Edge length of full-size tiles.
    pub tile_size: u32,

    /// Number of concurrent fetch workers.
    pub workers: usize,

    /// Pause before each queue pop.
    pub request_delay: Duration,

    /// What to do when a tile request is refused.
    pub retry: RetryPolicy,

    /// Consecutive transport faults tolerated on one tile.
    pub transport_failure_limit: u32,

    /// Encoding requested from the server.
    pub format: ImageFormat,

    /// Completed tiles between progress reports.
    pub progress_interval: usize,

    /// Share a cool-down across workers when any of them is throttled.
    pub shared_backoff: bool,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// Grace period for workers to stop after cancellation.
    pub shutdown_grace: Duration,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            workers: DEFAULT_WORKER_COUNT,
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            retry: RetryPolicy::default(),
            transport_failure_limit: DEFAULT_TRANSPORT_FAILURE_LIMIT,
            format: ImageFormat::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            shared_backoff: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
        }
    }
}

impl StitchConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the `[download]` and `[output]` file sections.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let download = &config.download;
        let mut retry = RetryPolicy::fixed(Duration::from_secs(download.retry_delay_secs));
        if let Some(max) = download.max_attempts {
            retry = retry.with_max_attempts(max);
        }

        Self {
            tile_size: download.tile_size,
            workers: download.workers,
            request_delay: Duration::from_millis(download.request_delay_ms),
            retry,
            format: config.output.format,
            shared_backoff: download.shared_backoff,
            timeout: Duration::from_secs(download.timeout),
            ..Self::default()
        }
    }

    /// Set the tile size.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set the number of workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the pause before each queue pop.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the consecutive transport fault limit.
    pub fn with_transport_failure_limit(mut self, limit: u32) -> Self {
        self.transport_failure_limit = limit;
        self
    }

    /// Set the requested encoding.
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the progress reporting interval.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Enable or disable the shared throttle cool-down.
    pub fn with_shared_backoff(mut self, enabled: bool) -> Self {
        self.shared_backoff = enabled;
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the shutdown grace period.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Checks the values a run cannot start with.
    pub fn validate(&self) -> StitchResult<()> {
        if self.tile_size == 0 {
            return Err(StitchError::InvalidInput(
                "tile size must be positive".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(StitchError::InvalidInput(
                "at least one worker is required".to_string(),
            ));
        }
        if self.progress_interval == 0 {
            return Err(StitchError::InvalidInput(
                "progress interval must be positive".to_string(),
            ));
        }
        if self.transport_failure_limit == 0 {
            return Err(StitchError::InvalidInput(
                "transport failure limit must be positive".to_string(),
            ));
        }
        if self.retry.delay.is_zero() {
            return Err(StitchError::InvalidInput(
                "retry delay must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StitchConfig::default();
        assert_eq!(config.tile_size, 256);
        assert_eq!(config.workers, 2);
        assert_eq!(config.request_delay, Duration::from_millis(100));
        assert_eq!(config.retry.delay, Duration::from_secs(180));
        assert!(config.retry.is_unbounded());
        assert_eq!(config.format, ImageFormat::Jpg);
        assert!(!config.shared_backoff);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = StitchConfig::new()
            .with_tile_size(512)
            .with_workers(4)
            .with_format(ImageFormat::Png)
            .with_shared_backoff(true)
            .with_retry(RetryPolicy::fixed(Duration::from_secs(1)).with_max_attempts(2));

        assert_eq!(config.tile_size, 512);
        assert_eq!(config.workers, 4);
        assert_eq!(config.format, ImageFormat::Png);
        assert!(config.shared_backoff);
        assert_eq!(config.retry.max_attempts, Some(2));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(StitchConfig::new().with_tile_size(0).validate().is_err());
        assert!(StitchConfig::new().with_workers(0).validate().is_err());
        assert!(StitchConfig::new()
            .with_progress_interval(0)
            .validate()
            .is_err());
        assert!(StitchConfig::new()
            .with_transport_failure_limit(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_rejects_zero_retry_delay() {
        let result = StitchConfig::new()
            .with_retry(RetryPolicy::fixed(Duration::ZERO))
            .validate();
        assert!(matches!(result, Err(StitchError::InvalidInput(msg)) if msg.contains("retry delay")));

        assert!(StitchConfig::new()
            .with_retry(RetryPolicy::fixed(Duration::from_millis(1)))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.download.workers = 6;
        file.download.retry_delay_secs = 30;
        file.download.max_attempts = Some(10);
        file.output.format = ImageFormat::Png;

        let config = StitchConfig::from_config_file(&file);

        assert_eq!(config.workers, 6);
        assert_eq!(config.retry.delay, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, Some(10));
        assert_eq!(config.format, ImageFormat::Png);
        assert_eq!(config.progress_interval, DEFAULT_PROGRESS_INTERVAL);
    }
}
