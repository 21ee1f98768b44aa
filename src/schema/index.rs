use crate::types::CellType;
use serde_json::Value;
use std::collections::HashMap;

/// Lookup operations the unflattening core needs from a schema.
///
/// Field paths are canonical: segments joined with `/`, no array markers
/// (`testA/id`, even when `testA` is array-typed).
pub trait SchemaLookup {
    /// Declared type for a field path, if the schema declares one.
    fn type_of(&self, field_path: &str) -> Option<CellType>;

    /// Human-readable title for a field path.
    fn title_of(&self, field_path: &str) -> Option<&str>;

    /// Canonical field path for a title at a given nesting level (0 = top).
    fn field_for_title(&self, title: &str, level: usize) -> Option<&str>;
}

/// In-memory index over a JSON-Schema-like document.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    types: HashMap<String, CellType>,
    titles: HashMap<String, String>,
    // One title -> field-path map per nesting level.
    by_title: Vec<HashMap<String, String>>,
}

impl SchemaIndex {
    /// Build an index by walking `properties`/`items` recursively.
    ///
    /// Unknown keywords are ignored; a schema this crate cannot interpret
    /// simply yields an index that resolves nothing, and titles then fall
    /// back to literal field names.
    pub fn from_value(schema: &Value) -> Self {
        let mut index = SchemaIndex::default();
        index.walk(schema, "", 0);
        index
    }

    fn walk(&mut self, node: &Value, prefix: &str, level: usize) {
        let Some(properties) = node.get("properties").and_then(|p| p.as_object()) else {
            return;
        };
        for (name, field_schema) in properties {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };

            if let Some(title) = field_schema.get("title").and_then(|t| t.as_str()) {
                if self.by_title.len() <= level {
                    self.by_title.resize_with(level + 1, HashMap::new);
                }
                self.by_title[level].insert(title.to_string(), path.clone());
                self.titles.insert(path.clone(), title.to_string());
            }

            match field_schema.get("type").and_then(|t| t.as_str()) {
                Some("object") => {
                    self.walk(field_schema, &path, level + 1);
                }
                Some("array") => {
                    self.types.insert(path.clone(), CellType::Array);
                    if let Some(items) = field_schema.get("items") {
                        self.walk(items, &path, level + 1);
                    }
                }
                Some(scalar) => {
                    if let Some(ty) = CellType::from_suffix(scalar) {
                        self.types.insert(path.clone(), ty);
                    }
                }
                None => {}
            }
        }
    }
}

impl SchemaLookup for SchemaIndex {
    fn type_of(&self, field_path: &str) -> Option<CellType> {
        self.types.get(field_path).copied()
    }

    fn title_of(&self, field_path: &str) -> Option<&str> {
        self.titles.get(field_path).map(String::as_str)
    }

    fn field_for_title(&self, title: &str, level: usize) -> Option<&str> {
        self.by_title
            .get(level)
            .and_then(|m| m.get(title))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_index() -> SchemaIndex {
        SchemaIndex::from_value(&json!({
            "properties": {
                "id": {"title": "Identifier", "type": "integer"},
                "testA": {"title": "A title", "type": "integer"},
                "testB": {
                    "title": "B title",
                    "type": "object",
                    "properties": {
                        "testC": {"title": "C title", "type": "integer"},
                        "testD": {"title": "D title", "type": "integer"}
                    }
                },
                "items": {
                    "title": "Items",
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "quantity": {"title": "Quantity", "type": "number"}
                        }
                    }
                }
            }
        }))
    }

    #[test]
    fn test_type_lookup() {
        let index = sample_index();
        assert_eq!(index.type_of("id"), Some(CellType::Integer));
        assert_eq!(index.type_of("testB/testC"), Some(CellType::Integer));
        assert_eq!(index.type_of("items"), Some(CellType::Array));
        assert_eq!(index.type_of("items/quantity"), Some(CellType::Number));
        assert_eq!(index.type_of("missing"), None);
        // Objects carry no castable type.
        assert_eq!(index.type_of("testB"), None);
    }

    #[test]
    fn test_title_lookup_by_level() {
        let index = sample_index();
        assert_eq!(index.field_for_title("A title", 0), Some("testA"));
        assert_eq!(index.field_for_title("C title", 1), Some("testB/testC"));
        // Titles do not leak across levels.
        assert_eq!(index.field_for_title("C title", 0), None);
        assert_eq!(index.field_for_title("Quantity", 1), Some("items/quantity"));
    }

    #[test]
    fn test_title_of() {
        let index = sample_index();
        assert_eq!(index.title_of("testB/testD"), Some("D title"));
        assert_eq!(index.title_of("nope"), None);
    }

    #[test]
    fn test_empty_schema_resolves_nothing() {
        let index = SchemaIndex::from_value(&json!({}));
        assert_eq!(index.type_of("id"), None);
        assert_eq!(index.field_for_title("Identifier", 0), None);
    }
}
