//! Error types and handling for the CLI
//!
//! Exit codes follow the test-suite runner contract: `1` for input or system
//! errors and `2` for an unsupported specification version. Validity is not
//! an error; see [`Outcome`].

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code for a valid instance
pub const EXIT_VALID: i32 = 0;
/// Exit code for an invalid instance
pub const EXIT_INVALID: i32 = -1;
/// Exit code for input or system errors
pub const EXIT_ERROR: i32 = 1;
/// Exit code for an unsupported specification version
pub const EXIT_UNSUPPORTED: i32 = 2;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from schemata-core library
    #[error("Core error: {0}")]
    Core(#[from] schemata_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// A `file#pointer` location that cannot be used
    #[error("Cannot process location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Specification version token not recognised
    #[error("`{0}` is not supported")]
    UnsupportedVersion(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid location error
    pub fn invalid_location(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnsupportedVersion(_) => EXIT_UNSUPPORTED,
            _ => EXIT_ERROR,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidLocation { .. })
    }
}

/// Result of a completed evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    Invalid,
    /// Commands that do not evaluate anything
    Done,
}

impl Outcome {
    pub fn from_validity(valid: bool) -> Self {
        if valid {
            Self::Valid
        } else {
            Self::Invalid
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Self::Valid | Self::Done => EXIT_VALID,
            Self::Invalid => EXIT_INVALID,
        }
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}
