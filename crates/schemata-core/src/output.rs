//! Output projections of the result tree
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::result::LocalResult;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Shape of the serialized evaluation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Validity only
    #[default]
    Flag,
    /// Flat list of error or annotation units
    Basic,
    /// Hierarchy reduced to the units that explain the outcome
    Detailed,
    /// Full hierarchy mirroring the schema
    Hierarchical,
}

/// One unit of serialized output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputUnit {
    pub valid: bool,
    pub evaluation_path: String,
    pub schema_location: String,
    pub instance_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, Value>>,
    /// Messages keyed by keyword; node-level messages use the empty key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<OutputUnit>,
}

impl OutputUnit {
    fn bare(result: &LocalResult) -> Self {
        Self {
            valid: result.valid,
            evaluation_path: result.evaluation_path.clone(),
            schema_location: result.schema_location.clone(),
            instance_location: result.instance_location.clone(),
            annotations: None,
            errors: None,
            details: Vec::new(),
        }
    }

    fn has_content(&self) -> bool {
        self.annotations.is_some() || self.errors.is_some()
    }
}

/// Everything one validation call produced
#[derive(Debug, Clone)]
pub struct EvaluationResults {
    root: LocalResult,
    format: OutputFormat,
}

impl EvaluationResults {
    pub(crate) fn new(root: LocalResult, format: OutputFormat) -> Self {
        Self { root, format }
    }

    pub fn is_valid(&self) -> bool {
        self.root.valid
    }

    /// The raw result tree
    pub fn root(&self) -> &LocalResult {
        &self.root
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Project the result tree with the configured format
    pub fn to_output(&self) -> OutputUnit {
        self.to_output_as(self.format)
    }

    pub fn to_output_as(&self, format: OutputFormat) -> OutputUnit {
        match format {
            OutputFormat::Flag => OutputUnit::bare(&self.root),
            OutputFormat::Hierarchical => hierarchical(&self.root),
            OutputFormat::Detailed => {
                let mut unit = hierarchical(&self.root);
                unit.details = condense(unit.details, unit.valid);
                unit
            }
            OutputFormat::Basic => {
                let full = hierarchical(&self.root);
                let mut root = OutputUnit {
                    details: Vec::new(),
                    ..full.clone()
                };
                let mut flat = Vec::new();
                flatten(full.details, root.valid, &mut flat);
                root.details = flat;
                root
            }
        }
    }
}

impl Serialize for EvaluationResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_output().serialize(serializer)
    }
}

/// A node result with its keyword messages folded in
fn hierarchical(node: &LocalResult) -> OutputUnit {
    let mut unit = OutputUnit::bare(node);

    let mut errors = BTreeMap::new();
    if !node.errors.is_empty() {
        errors.insert(String::new(), node.errors.join("; "));
    }
    for keyword in node.children.iter().filter(|keyword| !keyword.skipped) {
        if let Some(name) = &keyword.keyword {
            if !keyword.errors.is_empty() {
                errors.insert(name.clone(), keyword.errors.join("; "));
            }
        }
        for child in &keyword.children {
            unit.details.push(hierarchical(child));
        }
    }
    if !errors.is_empty() {
        unit.errors = Some(errors);
    }
    if node.valid && !node.annotations.is_empty() {
        unit.annotations = Some(node.annotations.clone());
    }
    unit
}

fn condense(details: Vec<OutputUnit>, valid: bool) -> Vec<OutputUnit> {
    let mut out = Vec::new();
    for mut unit in details {
        if unit.valid != valid {
            continue;
        }
        unit.details = condense(std::mem::take(&mut unit.details), valid);
        if !unit.has_content() && unit.details.len() == 1 {
            out.append(&mut unit.details);
        } else if unit.has_content() || !unit.details.is_empty() {
            out.push(unit);
        }
    }
    out
}

fn flatten(details: Vec<OutputUnit>, valid: bool, out: &mut Vec<OutputUnit>) {
    for mut unit in details {
        let children = std::mem::take(&mut unit.details);
        if unit.valid == valid && unit.has_content() {
            out.push(unit);
        }
        flatten(children, valid, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> LocalResult {
        let mut root = LocalResult::new(None, String::new(), String::new(), "urn:s#".into());
        root.valid = false;
        let mut properties = LocalResult::new(
            Some("properties".into()),
            String::new(),
            "/properties".into(),
            "urn:s#/properties".into(),
        );
        properties.valid = false;
        properties.errors.push("Properties [\"a\"] failed validation".into());

        let mut child = LocalResult::new(None, "/a".into(), "/properties/a".into(), "urn:s#/properties/a".into());
        child.valid = false;
        let mut kind = LocalResult::new(
            Some("type".into()),
            "/a".into(),
            "/properties/a/type".into(),
            "urn:s#/properties/a/type".into(),
        );
        kind.valid = false;
        kind.errors.push("Value is integer but should be string".into());
        child.children.push(kind);
        properties.children.push(child);
        root.children.push(properties);
        root
    }

    #[test]
    fn test_flag() {
        let results = EvaluationResults::new(sample(), OutputFormat::Flag);
        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value["valid"], json!(false));
        assert!(value.get("details").is_none());
    }

    #[test]
    fn test_hierarchical_nests_details() {
        let unit = EvaluationResults::new(sample(), OutputFormat::Hierarchical).to_output();
        assert_eq!(unit.details.len(), 1);
        let child = &unit.details[0];
        assert_eq!(child.instance_location, "/a");
        assert_eq!(
            child.errors.as_ref().unwrap()["type"],
            "Value is integer but should be string"
        );
    }

    #[test]
    fn test_basic_is_flat() {
        let unit = EvaluationResults::new(sample(), OutputFormat::Basic).to_output();
        assert_eq!(unit.details.len(), 1);
        assert!(unit.details.iter().all(|d| d.details.is_empty()));
        assert!(unit.errors.as_ref().unwrap().contains_key("properties"));
    }

    #[test]
    fn test_format_names() {
        let format: OutputFormat = serde_json::from_value(json!("detailed")).unwrap();
        assert_eq!(format, OutputFormat::Detailed);
    }
}
