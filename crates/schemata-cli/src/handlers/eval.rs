//! Test-suite runner command handler
//!
//! Evaluates one instance against one schema, both addressed as
//! `<file>#<json-pointer>`, and reports validity through the exit code.

use super::{base_options, parse_spec_version};
use crate::cli::EvalArgs;
use crate::config::Config;
use crate::documents::DocumentLocation;
use crate::error::{Outcome, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use schemata_core::{JsonSchema, OutputFormat};
use tracing::{debug, info, instrument};

/// Handle the eval command
#[instrument(skip(config, output), fields(schema = %args.schema, instance = %args.instance))]
pub fn handle_eval(args: EvalArgs, config: &Config, output: &mut OutputWriter) -> Result<Outcome> {
    let _timer = Timer::with_details("eval_command", &args.schema);

    // The version is checked before any file is touched
    let draft = args.spec_version.as_deref().map(parse_spec_version).transpose()?;

    let schema_value = DocumentLocation::parse(&args.schema)?.load()?;
    let instance = DocumentLocation::parse(&args.instance)?.load()?;
    debug!("Schema and instance loaded");

    let schema = JsonSchema::from_value(schema_value)?;

    let mut options = base_options(config)?.with_output_format(OutputFormat::Flag);
    if let Some(draft) = draft {
        options = options.with_validate_as(draft);
    }
    if args.validate_formats {
        options = options.with_format_validation(true);
    }

    let results = {
        let _validation_timer = Timer::new("evaluation");
        schema.validate(&instance, &options)?
    };
    info!(valid = results.is_valid(), "Evaluation finished");

    output.unit(&results.to_output(), false)?;
    Ok(Outcome::from_validity(results.is_valid()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputStyle;
    use crate::error::Error;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn suite_file(dir: &Path) -> String {
        let path = dir.join("suite.json");
        fs::write(
            &path,
            r#"[{
                "schema": {"$schema": "https://json-schema.org/draft/2020-12/schema", "minimum": 2},
                "tests": [{"data": 3}, {"data": 1}]
            }]"#,
        )
        .unwrap();
        path.display().to_string()
    }

    fn args(file: &str, data: usize, version: Option<&str>) -> EvalArgs {
        EvalArgs {
            schema: format!("{}#/0/schema", file),
            instance: format!("{}#/0/tests/{}/data", file, data),
            spec_version: version.map(str::to_string),
            validate_formats: false,
        }
    }

    fn quiet() -> OutputWriter {
        OutputWriter::new(OutputStyle::Human, false, true)
    }

    #[test]
    fn test_valid_and_invalid() {
        let dir = TempDir::new().unwrap();
        let file = suite_file(dir.path());
        let config = Config::default();

        let valid = handle_eval(args(&file, 0, None), &config, &mut quiet()).unwrap();
        assert_eq!(valid, Outcome::Valid);

        let invalid = handle_eval(args(&file, 1, Some("2020-12")), &config, &mut quiet()).unwrap();
        assert_eq!(invalid, Outcome::Invalid);
    }

    #[test]
    fn test_unsupported_version() {
        let dir = TempDir::new().unwrap();
        let file = suite_file(dir.path());
        let err = handle_eval(args(&file, 0, Some("draft-03")), &Config::default(), &mut quiet()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_input() {
        let err = handle_eval(args("/nonexistent/suite.json", 0, None), &Config::default(), &mut quiet())
            .unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
