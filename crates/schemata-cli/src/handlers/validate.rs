//! Validation command handler

use super::{base_options, parse_spec_version};
use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::documents::{load_document, DocumentLocation};
use crate::error::{Outcome, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use schemata_core::{JsonPointer, OutputFormat, SchemaParser};
use tracing::{info, instrument, warn};

/// Handle the validate command
#[instrument(skip(config, output), fields(schema = %args.schema.display(), instance = %args.instance.display()))]
pub fn handle_validate(args: ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<Outcome> {
    let _timer = Timer::with_details("validate_command", &format!("schema: {}", args.schema.display()));
    output.info(&format!(
        "Validating {} against {}",
        args.instance.display(),
        args.schema.display()
    ))?;

    let location = DocumentLocation {
        path: args.schema.clone(),
        pointer: JsonPointer::root(),
    };
    let schema_value = location.load()?;
    let instance = load_document(&args.instance)?;

    // Relative references resolve next to the schema file
    let mut parser = SchemaParser::new();
    if let Some(base) = location.file_uri() {
        parser = parser.with_base_uri(base);
    }
    let schema = parser.parse(schema_value)?;

    let format: OutputFormat = args
        .format
        .map(Into::into)
        .unwrap_or(config.validation.output_format);
    let mut options = base_options(config)?.with_output_format(format);
    if let Some(token) = args.spec_version.as_deref() {
        options = options.with_validate_as(parse_spec_version(token)?);
    }
    if args.validate_formats {
        options = options.with_format_validation(true);
    }
    if args.only_known_formats {
        options = options.with_only_known_formats(true);
    }
    if args.short_circuit {
        options = options.with_short_circuit(true);
    }
    if let Some(depth) = args.max_depth {
        options = options.with_max_traversal_depth(depth);
    }
    if args.data_references {
        options = options.with_data_references(true);
    }

    let results = {
        let _validation_timer = Timer::new("evaluation");
        schema.validate(&instance, &options)?
    };

    if results.is_valid() {
        info!("Instance is valid");
    } else {
        warn!("Instance is invalid");
    }
    output.unit(&results.to_output(), config.output.show_annotations)?;

    Ok(Outcome::from_validity(results.is_valid()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{OutputStyle, ResultFormat};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args(schema: PathBuf, instance: PathBuf) -> ValidateArgs {
        ValidateArgs {
            schema,
            instance,
            format: Some(ResultFormat::Basic),
            spec_version: None,
            validate_formats: false,
            only_known_formats: false,
            short_circuit: false,
            max_depth: None,
            data_references: false,
        }
    }

    fn quiet() -> OutputWriter {
        OutputWriter::new(OutputStyle::Human, false, true)
    }

    #[test]
    fn test_relative_reference_to_sibling_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("person.json"),
            r#"{"type": "object", "properties": {"age": {"$ref": "age.json"}}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("age.json"), r#"{"type": "integer", "minimum": 0}"#).unwrap();
        fs::write(dir.path().join("good.yaml"), "age: 30\n").unwrap();
        fs::write(dir.path().join("bad.json"), r#"{"age": -1}"#).unwrap();

        let mut config = Config::default();
        config.documents.allow_file_uris = true;

        let good = args(dir.path().join("person.json"), dir.path().join("good.yaml"));
        assert_eq!(handle_validate(good, &config, &mut quiet()).unwrap(), Outcome::Valid);

        let bad = args(dir.path().join("person.json"), dir.path().join("bad.json"));
        assert_eq!(handle_validate(bad, &config, &mut quiet()).unwrap(), Outcome::Invalid);
    }

    #[test]
    fn test_file_references_need_permission() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("schema.json"), r#"{"$ref": "other.json"}"#).unwrap();
        fs::write(dir.path().join("other.json"), "true").unwrap();
        fs::write(dir.path().join("data.json"), "1").unwrap();

        let outcome = handle_validate(
            args(dir.path().join("schema.json"), dir.path().join("data.json")),
            &Config::default(),
            &mut quiet(),
        )
        .unwrap();
        assert_eq!(outcome, Outcome::Invalid);
    }

    #[test]
    fn test_traversal_limit_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("loop.json"),
            r##"{"$defs": {"a": {"$ref": "#/$defs/a"}}, "$ref": "#/$defs/a"}"##,
        )
        .unwrap();
        fs::write(dir.path().join("data.json"), "{}").unwrap();

        let mut looping = args(dir.path().join("loop.json"), dir.path().join("data.json"));
        looping.max_depth = Some(8);
        let err = handle_validate(looping, &Config::default(), &mut quiet()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
