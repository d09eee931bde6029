//! Embedded meta-schemas
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::draft::Draft;
use crate::registry::{uri_key, SchemaResource};
use crate::schema::{JsonSchema, SchemaParser};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::warn;
use url::Url;

const SOURCES: &[(&str, &str)] = &[
    (
        "http://json-schema.org/draft-06/schema",
        include_str!("../meta/draft-06/schema.json"),
    ),
    (
        "http://json-schema.org/draft-07/schema",
        include_str!("../meta/draft-07/schema.json"),
    ),
    (
        "https://json-schema.org/draft/2019-09/schema",
        include_str!("../meta/2019-09/schema.json"),
    ),
    (
        "https://json-schema.org/draft/2019-09/meta/core",
        include_str!("../meta/2019-09/meta/core.json"),
    ),
    (
        "https://json-schema.org/draft/2019-09/meta/applicator",
        include_str!("../meta/2019-09/meta/applicator.json"),
    ),
    (
        "https://json-schema.org/draft/2019-09/meta/validation",
        include_str!("../meta/2019-09/meta/validation.json"),
    ),
    (
        "https://json-schema.org/draft/2019-09/meta/meta-data",
        include_str!("../meta/2019-09/meta/meta-data.json"),
    ),
    (
        "https://json-schema.org/draft/2019-09/meta/format",
        include_str!("../meta/2019-09/meta/format.json"),
    ),
    (
        "https://json-schema.org/draft/2019-09/meta/content",
        include_str!("../meta/2019-09/meta/content.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/schema",
        include_str!("../meta/2020-12/schema.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/core",
        include_str!("../meta/2020-12/meta/core.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/applicator",
        include_str!("../meta/2020-12/meta/applicator.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/unevaluated",
        include_str!("../meta/2020-12/meta/unevaluated.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/validation",
        include_str!("../meta/2020-12/meta/validation.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/meta-data",
        include_str!("../meta/2020-12/meta/meta-data.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/format-annotation",
        include_str!("../meta/2020-12/meta/format-annotation.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/content",
        include_str!("../meta/2020-12/meta/content.json"),
    ),
];

struct MetaSchemas {
    documents: Vec<JsonSchema>,
    resources: HashMap<String, Arc<SchemaResource>>,
}

static META_SCHEMAS: OnceLock<MetaSchemas> = OnceLock::new();

fn load(uri: &str, text: &str) -> Option<JsonSchema> {
    let base = match Url::parse(uri) {
        Ok(base) => base,
        Err(e) => {
            warn!(uri, error = %e, "Invalid meta-schema URI");
            return None;
        }
    };
    match SchemaParser::new().with_base_uri(base).parse_str(text) {
        Ok(schema) => Some(schema),
        Err(e) => {
            warn!(uri, error = %e, "Failed to parse embedded meta-schema");
            None
        }
    }
}

fn meta_schemas() -> &'static MetaSchemas {
    META_SCHEMAS.get_or_init(|| {
        let documents: Vec<JsonSchema> = SOURCES
            .iter()
            .filter_map(|(uri, text)| load(uri, text))
            .collect();
        let mut resources = HashMap::new();
        for schema in &documents {
            for (key, resource) in schema.resources() {
                resources.insert(key.to_string(), resource.clone());
            }
        }
        MetaSchemas {
            documents,
            resources,
        }
    })
}

/// Every embedded meta-schema document
pub(crate) fn documents() -> &'static [JsonSchema] {
    &meta_schemas().documents
}

/// Embedded resource for `uri`, if it names one of the official meta-schemas
pub(crate) fn lookup(uri: &Url) -> Option<Arc<SchemaResource>> {
    meta_schemas().resources.get(&uri_key(uri)).cloned()
}

/// The official meta-schema of `draft`
pub fn for_draft(draft: Draft) -> Option<JsonSchema> {
    let uri = Url::parse(draft.meta_schema_uri()).ok()?;
    let key = uri_key(&uri);
    documents()
        .iter()
        .find(|schema| uri_key(schema.base_uri()) == key)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_meta_schemas_parse() {
        assert_eq!(documents().len(), SOURCES.len());
    }

    #[test]
    fn test_for_draft() {
        for draft in Draft::ALL {
            let schema = for_draft(draft).unwrap();
            assert_eq!(schema.root().draft(), draft);
        }
    }

    #[test]
    fn test_lookup_ignores_fragment() {
        let uri = Url::parse("http://json-schema.org/draft-07/schema#").unwrap();
        let resource = lookup(&uri).unwrap();
        assert!(resource.anchor("nope").is_none());
        assert_eq!(resource.draft(), Draft::Draft7);

        let vocab = Url::parse("https://json-schema.org/draft/2019-09/meta/core").unwrap();
        assert!(lookup(&vocab).unwrap().has_recursive_anchor());
    }
}
