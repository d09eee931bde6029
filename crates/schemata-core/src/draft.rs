//! Specification drafts and draft sets
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A released JSON Schema specification draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Draft {
    #[serde(rename = "draft-06")]
    Draft6,
    #[serde(rename = "draft-07")]
    Draft7,
    #[serde(rename = "2019-09")]
    Draft201909,
    #[serde(rename = "2020-12")]
    Draft202012,
}

/// Error returned when a draft token is not recognized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported specification version '{0}'")]
pub struct UnsupportedDraft(pub String);

impl Draft {
    /// All supported drafts, oldest first
    pub const ALL: [Draft; 4] = [
        Draft::Draft6,
        Draft::Draft7,
        Draft::Draft201909,
        Draft::Draft202012,
    ];

    /// The most recent supported draft
    pub const fn latest() -> Self {
        Draft::Draft202012
    }

    const fn bit(self) -> u8 {
        match self {
            Draft::Draft6 => 1,
            Draft::Draft7 => 2,
            Draft::Draft201909 => 4,
            Draft::Draft202012 => 8,
        }
    }

    /// Canonical meta-schema URI of this draft
    pub const fn meta_schema_uri(self) -> &'static str {
        match self {
            Draft::Draft6 => "http://json-schema.org/draft-06/schema#",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema#",
            Draft::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Draft::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    /// Detect a draft from a `$schema` value.
    ///
    /// The scheme and a trailing empty fragment are not significant.
    pub fn from_meta_schema_uri(uri: &str) -> Option<Self> {
        let normalized = normalize_meta_uri(uri);
        Draft::ALL
            .into_iter()
            .find(|draft| normalize_meta_uri(draft.meta_schema_uri()) == normalized)
    }

    /// Whether `$ref` hides its sibling keywords in this draft
    pub fn ref_overrides_siblings(self) -> bool {
        self <= Draft::Draft7
    }

    /// Whether `$id` values starting with `#` declare plain-name anchors
    pub fn id_declares_anchor(self) -> bool {
        self <= Draft::Draft7
    }
}

fn normalize_meta_uri(uri: &str) -> &str {
    let uri = uri.trim_end_matches('#');
    uri.strip_prefix("https://")
        .or_else(|| uri.strip_prefix("http://"))
        .unwrap_or(uri)
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Draft::Draft6 => "draft-06",
            Draft::Draft7 => "draft-07",
            Draft::Draft201909 => "2019-09",
            Draft::Draft202012 => "2020-12",
        };
        f.write_str(name)
    }
}

impl FromStr for Draft {
    type Err = UnsupportedDraft;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "6" | "06" | "draft-6" | "draft-06" | "draft6" => Ok(Draft::Draft6),
            "7" | "07" | "draft-7" | "draft-07" | "draft7" => Ok(Draft::Draft7),
            "2019-09" | "draft-2019-09" | "draft2019-09" => Ok(Draft::Draft201909),
            "2020-12" | "draft-2020-12" | "draft2020-12" => Ok(Draft::Draft202012),
            other => Draft::from_meta_schema_uri(other).ok_or_else(|| UnsupportedDraft(other.to_string())),
        }
    }
}

/// A set of drafts stored as a bitmask
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DraftSet(u8);

impl DraftSet {
    /// No drafts
    pub const EMPTY: DraftSet = DraftSet(0);
    /// Every supported draft
    pub const ALL: DraftSet = DraftSet(0b1111);

    /// Build a set from a list of drafts
    pub const fn of(drafts: &[Draft]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < drafts.len() {
            bits |= drafts[i].bit();
            i += 1;
        }
        DraftSet(bits)
    }

    /// Every draft from `draft` onwards
    pub const fn since(draft: Draft) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < Draft::ALL.len() {
            if Draft::ALL[i].bit() >= draft.bit() {
                bits |= Draft::ALL[i].bit();
            }
            i += 1;
        }
        DraftSet(bits)
    }

    /// Every draft up to and including `draft`
    pub const fn until(draft: Draft) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < Draft::ALL.len() {
            if Draft::ALL[i].bit() <= draft.bit() {
                bits |= Draft::ALL[i].bit();
            }
            i += 1;
        }
        DraftSet(bits)
    }

    pub fn contains(self, draft: Draft) -> bool {
        self.0 & draft.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: DraftSet) -> DraftSet {
        DraftSet(self.0 | other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Draft> {
        Draft::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl From<Draft> for DraftSet {
    fn from(draft: Draft) -> Self {
        DraftSet(draft.bit())
    }
}

impl FromIterator<Draft> for DraftSet {
    fn from_iter<I: IntoIterator<Item = Draft>>(iter: I) -> Self {
        iter.into_iter()
            .fold(DraftSet::EMPTY, |set, draft| set.union(draft.into()))
    }
}

impl fmt::Debug for DraftSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
