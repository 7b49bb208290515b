//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use tilestitch::config::ConfigFileError;
use tilestitch::StitchError;

/// Exit code used when the user interrupts a run.
const EXIT_INTERRUPTED: i32 = 130;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Invalid arguments or configuration
    Config(String),
    /// Failed to start the async runtime or signal handling
    Runtime(String),
    /// Failed to load the configuration file
    ConfigFile(ConfigFileError),
    /// Failed to look up image dimensions
    Metadata(StitchError),
    /// The stitching run failed
    Stitch(StitchError),
    /// Failed to write the output image
    FileWrite {
        path: PathBuf,
        error: image::ImageError,
    },
    /// Failed to create the output directory
    CreateDir {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        if let CliError::Stitch(StitchError::Cancelled) = self {
            eprintln!("Interrupted, nothing was saved.");
            process::exit(EXIT_INTERRUPTED)
        }

        eprintln!("Error: {}", self);

        match self {
            CliError::Metadata(_) => {
                eprintln!();
                eprintln!("Could not read the image size from the server.");
                eprintln!("Pass --width and --height to skip the lookup.");
            }
            CliError::Stitch(StitchError::RetriesExhausted { .. }) => {
                eprintln!();
                eprintln!("The server kept refusing requests. Try again later,");
                eprintln!("raise --retry-delay, or drop --max-attempts to wait indefinitely.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Metadata(e) => write!(f, "Failed to read image information: {}", e),
            CliError::Stitch(e) => write!(f, "Stitching failed: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
            CliError::CreateDir { path, error } => {
                write!(
                    f,
                    "Failed to create directory '{}': {}",
                    path.display(),
                    error
                )
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Metadata(e) => Some(e),
            CliError::Stitch(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::CreateDir { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CliError::Config("--width requires --height".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: --width requires --height"
        );

        let err = CliError::Stitch(StitchError::Incomplete {
            painted: 3,
            expected: 4,
        });
        assert!(err.to_string().starts_with("Stitching failed"));
        assert!(err.to_string().contains("3 of 4"));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err = CliError::Stitch(StitchError::Cancelled);
        assert!(err.source().is_some());
        assert!(CliError::LoggingInit("x".to_string()).source().is_none());
    }
}
