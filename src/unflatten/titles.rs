//! Title-to-fieldname resolution for title-addressed columns.

use crate::schema::SchemaLookup;
use crate::types::{CellType, UnflattenConfig};
use crate::unflatten::path::{ParsedPath, PathSegment};

/// Resolves human-readable title paths to canonical field segments.
pub struct TitleResolver<'a> {
    config: &'a UnflattenConfig,
    schema: Option<&'a dyn SchemaLookup>,
}

impl<'a> TitleResolver<'a> {
    pub fn new(config: &'a UnflattenConfig, schema: Option<&'a dyn SchemaLookup>) -> Self {
        TitleResolver { config, schema }
    }

    /// Try to resolve a title-mode path against the schema.
    ///
    /// Returns `None` when the schema is absent or any segment has no title
    /// entry at its nesting level; the caller then falls back to reading the
    /// whole column key as a field path. The configured root-id title token
    /// resolves ahead of the schema, independent of its contents.
    pub fn resolve(&self, parsed: &ParsedPath) -> Option<ParsedPath> {
        if self.config.root_id_enabled() && parsed.segments.len() == 1 {
            let name = parsed.segments[0].name.as_str();
            if self.config.root_id_title.as_deref() == Some(name) {
                return Some(ParsedPath {
                    segments: vec![PathSegment {
                        name: self.config.root_id.clone(),
                        is_array: false,
                        is_attribute: false,
                        is_text: false,
                    }],
                    declared: parsed.declared,
                });
            }
        }

        let schema = self.schema?;
        let mut segments = Vec::with_capacity(parsed.segments.len());
        for (level, segment) in parsed.segments.iter().enumerate() {
            let path = schema.field_for_title(&segment.name, level)?;
            let field = path.rsplit('/').next().unwrap_or(path);
            // Titles carry no `[]` marker; the schema's declared type is
            // what says whether children group into list items.
            let is_array = segment.is_array || schema.type_of(path) == Some(CellType::Array);
            segments.push(PathSegment {
                name: field.to_string(),
                is_array,
                is_attribute: field.starts_with('@'),
                is_text: false,
            });
        }
        Some(ParsedPath {
            segments,
            declared: parsed.declared,
        })
    }
}
