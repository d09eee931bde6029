//! Error types for schema construction and evaluation
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Result type for schemata operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building catalogs, parsing schemas or evaluating them.
///
/// Ordinary assertion failures are never represented here; they are recorded
/// in the result tree. Only configuration problems, malformed schemas and
/// structural evaluation problems surface as errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad keyword registration or registry setup
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Malformed schema document or keyword value
    #[error("Failed to parse schema at '{location}': {reason}")]
    SchemaParse { location: String, reason: String },

    /// Malformed JSON text
    #[error("Failed to parse JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// I/O while reading a schema or instance
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Malformed URI in `$id`, `$ref` or options
    #[error("Invalid URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        source: url::ParseError,
    },

    /// A reference target could not be located
    #[error("Failed to resolve reference '{reference}' from '{base}': {reason}")]
    UnresolvedReference {
        reference: String,
        base: String,
        reason: String,
    },

    /// An injected fetcher could not provide a document
    #[error("Failed to fetch '{uri}': {reason}")]
    Fetch { uri: String, reason: String },

    /// Recursion went deeper than the configured limit
    #[error("Maximum traversal depth of {limit} exceeded at '{location}'")]
    TraversalLimitExceeded { limit: usize, location: String },
}

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a schema parse error at the given schema location
    pub fn schema_parse(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaParse {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid URI error
    pub fn invalid_uri(uri: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            source,
        }
    }

    /// Create an unresolved reference error
    pub fn unresolved(
        reference: impl Into<String>,
        base: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvedReference {
            reference: reference.into(),
            base: base.into(),
            reason: reason.into(),
        }
    }

    /// Create a fetch error
    pub fn fetch(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Create a traversal limit error
    pub fn traversal_limit(limit: usize, location: impl Into<String>) -> Self {
        Self::TraversalLimitExceeded {
            limit,
            location: location.into(),
        }
    }

    /// Whether this error aborts a whole validation call.
    ///
    /// Non-fatal errors raised by a keyword are recorded as a failed keyword
    /// result and evaluation continues with the sibling keywords.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TraversalLimitExceeded { .. })
    }

    /// Schema location associated with this error, if any
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::SchemaParse { location, .. } => Some(location),
            Self::TraversalLimitExceeded { location, .. } => Some(location),
            Self::UnresolvedReference { base, .. } => Some(base),
            _ => None,
        }
    }
}
