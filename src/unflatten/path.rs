//! Column-key parsing: `a/b[]/@id:integer` -> typed path segments.

use crate::error::{UnflattenError, UnflattenResult};
use crate::types::CellType;

/// Reserved final segment marking element text in XML-shaped columns.
pub const TEXT_MARKER: &str = "text()";

/// One step through the nested structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Field name. Attribute segments keep their leading `@` so a downstream
    /// XML writer can recognize them.
    pub name: String,
    /// Segment carried a `[]` marker: children group into list items.
    pub is_array: bool,
    /// Segment starts with `@` (XML attribute; irrelevant to JSON nesting).
    pub is_attribute: bool,
    /// Segment is the reserved `text()` marker.
    pub is_text: bool,
}

/// A parsed column key: the segment path plus any inline `:type` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub segments: Vec<PathSegment>,
    pub declared: Option<CellType>,
}

impl ParsedPath {
    /// Canonical field path with markers stripped, used for schema lookups
    /// (`a[]/b` -> `a/b`).
    pub fn canonical(&self) -> String {
        let names: Vec<&str> = self
            .segments
            .iter()
            .filter(|s| !s.is_text)
            .map(|s| s.name.as_str())
            .collect();
        names.join("/")
    }
}

/// Split a column key into path segments.
///
/// Spreadsheet columns are user-authored, so every non-blank shape must
/// tokenize; the only failure is a key that is empty after trimming.
pub fn parse_path(key: &str, separator: char, row: usize) -> UnflattenResult<ParsedPath> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(UnflattenError::MalformedPath {
            row,
            column: key.to_string(),
        });
    }

    let mut tokens: Vec<&str> = trimmed.split(separator).collect();

    // Inline type suffix. In field mode it rides inside the final token
    // (`id:integer`); in title mode the separator is already `:`, so a
    // recognized type name arrives as its own trailing token.
    let mut declared = None;
    if separator == ':' {
        if tokens.len() > 1 {
            if let Some(ty) = CellType::from_suffix(tokens[tokens.len() - 1]) {
                declared = Some(ty);
                tokens.pop();
            }
        }
    } else if let Some((head, suffix)) = tokens[tokens.len() - 1].rsplit_once(':') {
        if let Some(ty) = CellType::from_suffix(suffix) {
            declared = Some(ty);
            let last = tokens.len() - 1;
            tokens[last] = head;
        }
    }

    let last = tokens.len() - 1;
    let segments = tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            if i == last && *token == TEXT_MARKER {
                return PathSegment {
                    name: TEXT_MARKER.to_string(),
                    is_array: false,
                    is_attribute: false,
                    is_text: true,
                };
            }
            let (name, is_array) = match token.strip_suffix("[]") {
                Some(stripped) => (stripped, true),
                None => (*token, false),
            };
            PathSegment {
                name: name.to_string(),
                is_array,
                is_attribute: name.starts_with('@'),
                is_text: false,
            }
        })
        .collect();

    Ok(ParsedPath { segments, declared })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(key: &str) -> ParsedPath {
        parse_path(key, '/', 0).unwrap()
    }

    #[test]
    fn test_flat_key() {
        let path = parse("id");
        assert_eq!(path.segments.len(), 1);
        assert_eq!(path.segments[0].name, "id");
        assert!(!path.segments[0].is_array);
        assert_eq!(path.declared, None);
    }

    #[test]
    fn test_nested_key() {
        let path = parse("testA/testB");
        let names: Vec<&str> = path.segments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["testA", "testB"]);
    }

    #[test]
    fn test_array_marker_stripped() {
        let path = parse("testA[]/id");
        assert_eq!(path.segments[0].name, "testA");
        assert!(path.segments[0].is_array);
        assert!(!path.segments[1].is_array);
        assert_eq!(path.canonical(), "testA/id");
    }

    #[test]
    fn test_inline_type_suffix() {
        let path = parse("id:integer");
        assert_eq!(path.segments[0].name, "id");
        assert_eq!(path.declared, Some(CellType::Integer));

        // Unrecognized suffixes stay part of the name.
        let path = parse("id:other");
        assert_eq!(path.segments[0].name, "id:other");
        assert_eq!(path.declared, None);
    }

    #[test]
    fn test_type_suffix_in_title_mode() {
        let path = parse_path("A title:number", ':', 0).unwrap();
        assert_eq!(path.segments.len(), 1);
        assert_eq!(path.segments[0].name, "A title");
        assert_eq!(path.declared, Some(CellType::Number));

        // A lone type name is a field, not a suffix.
        let path = parse_path("number", ':', 0).unwrap();
        assert_eq!(path.segments[0].name, "number");
        assert_eq!(path.declared, None);
    }

    #[test]
    fn test_attribute_and_text_markers() {
        let path = parse("element/@attr");
        assert!(path.segments[1].is_attribute);
        assert_eq!(path.segments[1].name, "@attr");

        let path = parse("element/text()");
        assert!(path.segments[1].is_text);
        assert_eq!(path.canonical(), "element");
    }

    #[test]
    fn test_empty_key_is_malformed() {
        assert!(parse_path("", '/', 3).is_err());
        assert!(parse_path("   ", '/', 3).is_err());
    }

    #[test]
    fn test_array_with_type_suffix() {
        let path = parse("tags[]:string");
        assert_eq!(path.segments[0].name, "tags");
        assert!(path.segments[0].is_array);
        assert_eq!(path.declared, Some(CellType::String));
    }
}
