//! Document loading for schemas and instances
//!
//! Locations on the command line take the form `<file>#<json-pointer>`.
//! Remote references found while evaluating are served from local
//! directories through [`FileFetcher`].

use crate::config::DocumentConfig;
use crate::error::{Error, Result};
use schemata_core::{DocumentFetcher, JsonPointer};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// A file plus a pointer into its content
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLocation {
    pub path: PathBuf,
    pub pointer: JsonPointer,
}

impl DocumentLocation {
    /// Parse `<file>#<pointer>`; a missing fragment selects the whole document
    pub fn parse(location: &str) -> Result<Self> {
        let (path, fragment) = match location.split_once('#') {
            Some((path, fragment)) => (path, fragment),
            None => (location, ""),
        };
        if path.is_empty() {
            return Err(Error::invalid_location(location, "missing file path"));
        }
        let pointer = JsonPointer::from_fragment(fragment)
            .map_err(|e| Error::invalid_location(location, e.to_string()))?;
        Ok(Self {
            path: PathBuf::from(path),
            pointer,
        })
    }

    /// Load the file and select the addressed value
    pub fn load(&self) -> Result<Value> {
        let document = load_document(&self.path)?;
        self.pointer.evaluate(&document).cloned().ok_or_else(|| {
            Error::invalid_location(
                format!("{}#{}", self.path.display(), self.pointer),
                "pointer does not resolve",
            )
        })
    }

    /// `file://` URI of the document, used as the schema's base URI
    pub fn file_uri(&self) -> Option<Url> {
        let absolute = fs::canonicalize(&self.path).ok()?;
        Url::from_file_path(absolute).ok()
    }
}

/// Read a JSON or YAML document, choosing the parser by extension
pub fn load_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), "Reading document");
    let content = fs::read_to_string(path)?;

    if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
        })
    } else {
        serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
        })
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false)
}

/// Serves referenced documents from local directories
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    /// URI prefix and directory, longest prefix first
    mappings: Vec<(String, PathBuf)>,
    allow_file_uris: bool,
}

impl FileFetcher {
    pub fn new(config: &DocumentConfig) -> Self {
        let mut mappings: Vec<(String, PathBuf)> = config
            .mappings
            .iter()
            .map(|(prefix, dir)| (prefix.clone(), dir.clone()))
            .collect();
        mappings.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self {
            mappings,
            allow_file_uris: config.allow_file_uris,
        }
    }

    /// Map a URI onto a local path, if any mapping or file access covers it
    pub fn local_path(&self, uri: &Url) -> Option<PathBuf> {
        let target = uri.as_str();
        for (prefix, dir) in &self.mappings {
            if let Some(rest) = target.strip_prefix(prefix.as_str()) {
                return Some(dir.join(rest.trim_start_matches('/')));
            }
        }
        if self.allow_file_uris && uri.scheme() == "file" {
            return uri.to_file_path().ok();
        }
        None
    }
}

impl DocumentFetcher for FileFetcher {
    fn fetch(&self, uri: &Url) -> schemata_core::Result<Value> {
        let path = self
            .local_path(uri)
            .ok_or_else(|| schemata_core::Error::fetch(uri.as_str(), "no local mapping"))?;
        load_document(&path).map_err(|e| {
            warn!(uri = %uri, path = %path.display(), error = %e, "Failed to load referenced document");
            schemata_core::Error::fetch(uri.as_str(), e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_parse_location() {
        let location = DocumentLocation::parse("suite/tests.json#/0/schema").unwrap();
        assert_eq!(location.path, PathBuf::from("suite/tests.json"));
        assert_eq!(location.pointer.tokens(), ["0", "schema"]);

        let whole = DocumentLocation::parse("schema.json").unwrap();
        assert!(whole.pointer.is_root());

        assert!(DocumentLocation::parse("#/0").is_err());
        assert!(DocumentLocation::parse("a.json#nope").is_err());
    }

    #[test]
    fn test_load_with_pointer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tests.json");
        fs::write(&path, r#"[{"schema": {"type": "integer"}, "tests": [{"data": 3}]}]"#).unwrap();

        let location = DocumentLocation::parse(&format!("{}#/0/tests/0/data", path.display())).unwrap();
        assert_eq!(location.load().unwrap(), json!(3));

        let missing = DocumentLocation::parse(&format!("{}#/5", path.display())).unwrap();
        assert!(matches!(missing.load(), Err(Error::InvalidLocation { .. })));
    }

    #[test]
    fn test_load_yaml_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.yaml");
        fs::write(&path, "type: object\nrequired: [name]\n").unwrap();
        assert_eq!(
            load_document(&path).unwrap(),
            json!({"type": "object", "required": ["name"]})
        );
    }

    #[test]
    fn test_fetcher_mappings() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("integer.json"), r#"{"type": "integer"}"#).unwrap();

        let mut mappings = BTreeMap::new();
        mappings.insert("http://localhost:1234/".to_string(), dir.path().to_path_buf());
        let fetcher = FileFetcher::new(&DocumentConfig {
            mappings,
            allow_file_uris: false,
        });

        let uri = Url::parse("http://localhost:1234/integer.json").unwrap();
        assert_eq!(fetcher.fetch(&uri).unwrap(), json!({"type": "integer"}));

        let unmapped = Url::parse("http://example.com/integer.json").unwrap();
        assert!(fetcher.fetch(&unmapped).is_err());

        let file_uri = Url::from_file_path(dir.path().join("integer.json")).unwrap();
        assert!(fetcher.local_path(&file_uri).is_none());
    }
}
