//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod eval;
mod validate;

pub use completions::handle_completions;
pub use eval::handle_eval;
pub use validate::handle_validate;

use crate::config::Config;
use crate::documents::FileFetcher;
use crate::error::{Error, Result};
use schemata_core::{Draft, ValidationOptions};
use std::sync::Arc;

/// Map a `--spec-version` token onto a draft
pub(crate) fn parse_spec_version(token: &str) -> Result<Draft> {
    token
        .parse::<Draft>()
        .map_err(|_| Error::UnsupportedVersion(token.to_string()))
}

/// Validation options from the configuration plus the local document fetcher
pub(crate) fn base_options(config: &Config) -> Result<ValidationOptions> {
    let fetcher = FileFetcher::new(&config.documents);
    Ok(config.validation_options()?.with_fetcher(Arc::new(fetcher)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_version_tokens() {
        for token in ["6", "06", "draft-6", "draft-06"] {
            assert_eq!(parse_spec_version(token).unwrap(), Draft::Draft6);
        }
        for token in ["7", "07", "draft-7", "draft-07"] {
            assert_eq!(parse_spec_version(token).unwrap(), Draft::Draft7);
        }
        for token in ["2019-09", "draft-2019-09"] {
            assert_eq!(parse_spec_version(token).unwrap(), Draft::Draft201909);
        }
        for token in ["2020-12", "draft-2020-12"] {
            assert_eq!(parse_spec_version(token).unwrap(), Draft::Draft202012);
        }
        let err = parse_spec_version("draft-04").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
