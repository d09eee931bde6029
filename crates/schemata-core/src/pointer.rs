//! JSON Pointer (RFC 6901) parsing, rendering and evaluation
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing or evaluating a pointer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("JSON pointer must start with '/' or be empty: '{0}'")]
    MissingLeadingSlash(String),

    #[error("Invalid escape sequence in JSON pointer: '{0}'")]
    InvalidEscape(String),

    #[error("Property '{0}' not found")]
    PropertyNotFound(String),

    #[error("Array index {0} out of bounds")]
    IndexOutOfBounds(usize),

    #[error("Invalid array index '{0}'")]
    InvalidIndex(String),

    #[error("Cannot access '{0}' on a non-object/array value")]
    NotAContainer(String),
}

/// A parsed JSON pointer, stored as unescaped reference tokens
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    /// The empty pointer, referring to the whole document
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse the string form of a pointer
    pub fn parse(pointer: &str) -> Result<Self, PointerError> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let rest = pointer
            .strip_prefix('/')
            .ok_or_else(|| PointerError::MissingLeadingSlash(pointer.to_string()))?;

        let tokens = rest
            .split('/')
            .map(|segment| unescape(segment).ok_or_else(|| PointerError::InvalidEscape(pointer.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tokens })
    }

    /// Parse a pointer carried in a URI fragment, percent-decoding it first
    pub fn from_fragment(fragment: &str) -> Result<Self, PointerError> {
        Self::parse(&percent_decode(fragment))
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.tokens.pop()
    }

    /// Truncate to the first `len` tokens
    pub fn truncate(&mut self, len: usize) {
        self.tokens.truncate(len);
    }

    /// A new pointer with `token` appended
    pub fn join(&self, token: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.push(token);
        child
    }

    /// A new pointer with an array index appended
    pub fn join_index(&self, index: usize) -> Self {
        self.join(index.to_string())
    }

    /// Evaluate the pointer against a document
    pub fn resolve<'v>(&self, document: &'v Value) -> Result<&'v Value, PointerError> {
        let mut current = document;
        for token in &self.tokens {
            current = match current {
                Value::Object(map) => map
                    .get(token)
                    .ok_or_else(|| PointerError::PropertyNotFound(token.clone()))?,
                Value::Array(items) => {
                    let index = parse_index(token)?;
                    items
                        .get(index)
                        .ok_or(PointerError::IndexOutOfBounds(index))?
                }
                _ => return Err(PointerError::NotAContainer(token.clone())),
            };
        }
        Ok(current)
    }

    /// Evaluate the pointer, returning `None` when it does not resolve
    pub fn evaluate<'v>(&self, document: &'v Value) -> Option<&'v Value> {
        self.resolve(document).ok()
    }
}

fn parse_index(token: &str) -> Result<usize, PointerError> {
    let canonical = !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'));
    if !canonical {
        return Err(PointerError::InvalidIndex(token.to_string()));
    }
    token
        .parse()
        .map_err(|_| PointerError::InvalidIndex(token.to_string()))
}

fn unescape(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(ch);
        }
    }
    Some(out)
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Decode `%XX` sequences; malformed sequences are kept verbatim
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(byte) = hex {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

impl FromStr for JsonPointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Vec<String>> for JsonPointer {
    fn from(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_display() {
        let pointer = JsonPointer::parse("/a~1b/m~0n/0").unwrap();
        assert_eq!(pointer.tokens(), &["a/b", "m~n", "0"]);
        assert_eq!(pointer.to_string(), "/a~1b/m~0n/0");
        assert!(JsonPointer::parse("").unwrap().is_root());
    }

    #[test]
    fn test_invalid_pointers() {
        assert!(matches!(
            JsonPointer::parse("a/b"),
            Err(PointerError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            JsonPointer::parse("/a~2"),
            Err(PointerError::InvalidEscape(_))
        ));
        assert!(matches!(
            JsonPointer::parse("/a~"),
            Err(PointerError::InvalidEscape(_))
        ));
    }

    #[test]
    fn test_resolve() {
        let doc = json!({
            "$defs": {"a/b": {"type": "string"}},
            "items": [{"minimum": 1}, {"maximum": 2}],
            "": "empty key"
        });
        let pointer = JsonPointer::parse("/$defs/a~1b/type").unwrap();
        assert_eq!(pointer.evaluate(&doc), Some(&json!("string")));
        assert_eq!(
            JsonPointer::parse("/items/1/maximum").unwrap().evaluate(&doc),
            Some(&json!(2))
        );
        assert_eq!(JsonPointer::parse("/").unwrap().evaluate(&doc), Some(&json!("empty key")));
        assert_eq!(
            JsonPointer::parse("/items/01").unwrap().resolve(&doc),
            Err(PointerError::InvalidIndex("01".to_string()))
        );
        assert_eq!(
            JsonPointer::parse("/items/5").unwrap().resolve(&doc),
            Err(PointerError::IndexOutOfBounds(5))
        );
        assert_eq!(
            JsonPointer::parse("/missing").unwrap().resolve(&doc),
            Err(PointerError::PropertyNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_fragment_decoding() {
        let pointer = JsonPointer::from_fragment("/percent%25field/space%20here").unwrap();
        assert_eq!(pointer.tokens(), &["percent%field", "space here"]);
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn test_join() {
        let base = JsonPointer::root().join("properties").join("a/b");
        assert_eq!(base.join_index(3).to_string(), "/properties/a~1b/3");
    }
}
