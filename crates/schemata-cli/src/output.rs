//! Output formatting and writing utilities
//!
//! Evaluation outcomes are written either as a serialized output unit
//! (JSON, pretty JSON, YAML) or as a human-readable listing of failures.

use crate::cli::OutputStyle;
use crate::error::Result;
use colored::Colorize;
use schemata_core::OutputUnit;
use serde::Serialize;
use std::io::{self, Write};
use tracing::trace;

/// Formatting of values and output units per output style
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format an evaluation output unit
    fn format_unit(&self, unit: &OutputUnit, show_annotations: bool, use_color: bool) -> Result<String>;
}

impl OutputFormatter for OutputStyle {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputStyle::Json => Ok(serde_json::to_string(value)?),
            OutputStyle::JsonPretty | OutputStyle::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputStyle::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_unit(&self, unit: &OutputUnit, show_annotations: bool, use_color: bool) -> Result<String> {
        match self {
            OutputStyle::Human => Ok(format_unit_human(unit, show_annotations, use_color)),
            _ => self.format(unit),
        }
    }
}

/// Render an output unit tree as indented lines
pub fn format_unit_human(unit: &OutputUnit, show_annotations: bool, use_color: bool) -> String {
    let mut lines = Vec::new();
    let verdict = if unit.valid { "✓ valid" } else { "✗ invalid" };
    lines.push(match (use_color, unit.valid) {
        (true, true) => verdict.green().bold().to_string(),
        (true, false) => verdict.red().bold().to_string(),
        (false, _) => verdict.to_string(),
    });
    collect_lines(unit, show_annotations, use_color, &mut lines);
    lines.join("\n")
}

fn collect_lines(unit: &OutputUnit, show_annotations: bool, use_color: bool, lines: &mut Vec<String>) {
    let location = if unit.instance_location.is_empty() {
        "(root)"
    } else {
        unit.instance_location.as_str()
    };

    if let Some(errors) = &unit.errors {
        for (keyword, message) in errors {
            let keyword = if keyword.is_empty() { "schema" } else { keyword.as_str() };
            let head = format!("  {} [{}]", location, keyword);
            let head = if use_color { head.yellow().to_string() } else { head };
            lines.push(format!("{} {}", head, message));
            lines.push(format!("      at {}", unit.schema_location));
        }
    }

    if show_annotations {
        if let Some(annotations) = &unit.annotations {
            for (keyword, value) in annotations {
                let line = format!("  {} {} = {}", location, keyword, value);
                lines.push(if use_color { line.dimmed().to_string() } else { line });
            }
        }
    }

    for child in &unit.details {
        collect_lines(child, show_annotations, use_color, lines);
    }
}

/// Output writer that handles different output styles and colors
pub struct OutputWriter {
    style: OutputStyle,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(style: OutputStyle, use_color: bool, quiet: bool) -> Self {
        Self {
            style,
            use_color,
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    #[cfg(test)]
    pub fn with_writer(style: OutputStyle, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            style,
            use_color,
            quiet,
            writer,
        }
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message (human style only)
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.style != OutputStyle::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write an evaluation outcome
    pub fn unit(&mut self, unit: &OutputUnit, show_annotations: bool) -> Result<()> {
        if self.quiet && self.style == OutputStyle::Human {
            return Ok(());
        }
        trace!(valid = unit.valid, details = unit.details.len(), "Writing output unit");
        let formatted = self.style.format_unit(unit, show_annotations, self.use_color)?;
        self.writeln(formatted.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    fn failing_unit() -> OutputUnit {
        let mut errors = BTreeMap::new();
        errors.insert("type".to_string(), "Value is \"string\" but should be \"integer\"".to_string());
        OutputUnit {
            valid: false,
            evaluation_path: String::new(),
            schema_location: "https://example.com/s#".to_string(),
            instance_location: String::new(),
            annotations: None,
            errors: None,
            details: vec![OutputUnit {
                valid: false,
                evaluation_path: "/properties/age".to_string(),
                schema_location: "https://example.com/s#/properties/age".to_string(),
                instance_location: "/age".to_string(),
                annotations: None,
                errors: Some(errors),
                details: Vec::new(),
            }],
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_human_format_lists_failures() {
        let text = format_unit_human(&failing_unit(), false, false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "✗ invalid");
        assert!(lines[1].starts_with("  /age [type] Value is"));
        assert_eq!(lines[2], "      at https://example.com/s#/properties/age");
    }

    #[test]
    fn test_human_format_annotations() {
        let mut annotations = BTreeMap::new();
        annotations.insert("title".to_string(), serde_json::json!("Person"));
        let unit = OutputUnit {
            valid: true,
            evaluation_path: String::new(),
            schema_location: "urn:s#".to_string(),
            instance_location: String::new(),
            annotations: Some(annotations),
            errors: None,
            details: Vec::new(),
        };
        assert_eq!(format_unit_human(&unit, false, false), "✓ valid");
        assert_eq!(
            format_unit_human(&unit, true, false),
            "✓ valid\n  (root) title = \"Person\""
        );
    }

    #[test]
    fn test_machine_styles() {
        let unit = failing_unit();
        let json = OutputStyle::Json.format_unit(&unit, false, false).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["valid"], false);
        assert_eq!(parsed["details"][0]["instanceLocation"], "/age");

        let yaml = OutputStyle::Yaml.format_unit(&unit, false, false).unwrap();
        assert!(yaml.contains("instanceLocation"));
        assert!(yaml.contains("/age"));
    }

    #[test]
    fn test_writer_respects_quiet() {
        let buffer = SharedBuffer::default();
        let mut quiet = OutputWriter::with_writer(OutputStyle::Human, false, true, Box::new(buffer.clone()));
        quiet.info("hidden").unwrap();
        quiet.unit(&failing_unit(), false).unwrap();
        assert!(buffer.contents().is_empty());

        let mut json = OutputWriter::with_writer(OutputStyle::Json, false, true, Box::new(buffer.clone()));
        json.unit(&failing_unit(), false).unwrap();
        assert!(buffer.contents().starts_with("{\"valid\":false"));
    }
}
