//! Row unflattening: one flat row -> one nested record fragment.

use crate::error::{UnflattenError, UnflattenResult};
use crate::schema::SchemaLookup;
use crate::types::{AddressingMode, DataWarning, Row, UnflattenConfig, WarningKind};
use crate::unflatten::cast::{cast_cell, CastOutcome};
use crate::unflatten::path::{parse_path, ParsedPath, PathSegment};
use crate::unflatten::titles::TitleResolver;
use serde_json::{Map, Value};

/// What one row contributes to the output.
#[derive(Debug, Clone, PartialEq)]
pub enum RowFragment {
    /// Every semantic value in the row was empty; the row is skipped.
    Absent,
    /// A nested record fragment. May hold only the root identifier when
    /// everything else in the row was blank.
    Record(Map<String, Value>),
}

impl RowFragment {
    pub fn is_absent(&self) -> bool {
        matches!(self, RowFragment::Absent)
    }
}

/// Converts single rows into nested record fragments.
pub struct RowUnflattener<'a> {
    config: &'a UnflattenConfig,
    schema: Option<&'a dyn SchemaLookup>,
}

impl<'a> RowUnflattener<'a> {
    pub fn new(config: &'a UnflattenConfig, schema: Option<&'a dyn SchemaLookup>) -> Self {
        RowUnflattener { config, schema }
    }

    /// Unflatten one row.
    ///
    /// Columns are processed in the row's own order, which fixes field
    /// insertion order in the output. Empty cells contribute nothing. Both
    /// error variants are fatal to this row only.
    pub fn unflatten_row(
        &self,
        row: &Row,
        row_index: usize,
        warnings: &mut Vec<DataWarning>,
    ) -> UnflattenResult<RowFragment> {
        let mut record = Map::new();

        for (column, cell) in row.iter() {
            // Blank cells contribute nothing, so they are skipped before any
            // path or title work; an empty column never warns or errors.
            if cell.is_empty() {
                continue;
            }

            let parsed = self.parse_column(column, row_index, warnings)?;

            // The root identifier is recorded verbatim: casting it could
            // change its equality semantics and split a rollup group.
            let is_root_id = self.config.root_id_enabled()
                && parsed.segments.len() == 1
                && parsed.segments[0].name == self.config.root_id;
            let declared = if is_root_id {
                None
            } else {
                parsed.declared.or_else(|| {
                    self.schema
                        .and_then(|schema| schema.type_of(&parsed.canonical()))
                })
            };

            let outcome = cast_cell(
                cell,
                declared,
                self.config.array_delimiter,
                row_index,
                column,
                warnings,
            );
            let CastOutcome::Value(value) = outcome else {
                continue;
            };

            insert_value(&mut record, &parsed.segments, value, row_index, column)?;
        }

        if record.is_empty() {
            Ok(RowFragment::Absent)
        } else {
            Ok(RowFragment::Record(record))
        }
    }

    /// Parse a column key under the active addressing mode.
    ///
    /// In title mode an unresolved title path falls back to reading the
    /// whole key as a field path, so title mode degrades to field mode when
    /// no schema entry matches.
    fn parse_column(
        &self,
        column: &str,
        row_index: usize,
        warnings: &mut Vec<DataWarning>,
    ) -> UnflattenResult<ParsedPath> {
        match self.config.mode {
            AddressingMode::FieldNames => {
                parse_path(column, self.config.path_separator, row_index)
            }
            AddressingMode::Titles => {
                let parsed = parse_path(column, self.config.title_separator, row_index)?;
                let resolver = TitleResolver::new(self.config, self.schema);
                if let Some(resolved) = resolver.resolve(&parsed) {
                    return Ok(resolved);
                }
                if self.schema.is_some() {
                    warnings.push(DataWarning {
                        row: row_index,
                        column: column.to_string(),
                        kind: WarningKind::UnresolvedTitle,
                        message: format!(
                            "no schema title matches '{column}', treating it as a field name"
                        ),
                    });
                }
                parse_path(column, self.config.path_separator, row_index)
            }
        }
    }

    /// The row's root-identifier value, when one is configured and present.
    pub fn root_id_of(&self, fragment: &RowFragment) -> Option<Value> {
        let RowFragment::Record(record) = fragment else {
            return None;
        };
        if !self.config.root_id_enabled() {
            return None;
        }
        record.get(&self.config.root_id).cloned()
    }
}

/// Walk/create nested nodes along the path and set the leaf value.
///
/// At an array-marked segment the row's single in-flight list item is
/// selected (created on first touch), so two columns into the same array
/// always land in the same item within one row.
fn insert_value(
    record: &mut Map<String, Value>,
    segments: &[PathSegment],
    value: Value,
    row: usize,
    column: &str,
) -> UnflattenResult<()> {
    let conflict = |key: &str| UnflattenError::StructuralConflict {
        row,
        column: column.to_string(),
        key: key.to_string(),
    };

    let (leaf, parents) = segments.split_last().expect("parse_path yields >= 1 segment");

    let mut cursor = record;
    for segment in parents {
        if segment.is_array {
            let slot = cursor
                .entry(segment.name.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            let items = match slot {
                Value::Array(items) => items,
                _ => return Err(conflict(&segment.name)),
            };
            if items.is_empty() {
                items.push(Value::Object(Map::new()));
            }
            cursor = match items.last_mut() {
                Some(Value::Object(item)) => item,
                _ => return Err(conflict(&segment.name)),
            };
        } else {
            let slot = cursor
                .entry(segment.name.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            cursor = match slot {
                Value::Object(child) => child,
                _ => return Err(conflict(&segment.name)),
            };
        }
    }

    if leaf.is_array {
        let slot = cursor
            .entry(leaf.name.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        let items = match slot {
            Value::Array(items) => items,
            _ => return Err(conflict(&leaf.name)),
        };
        match value {
            Value::Array(values) => items.extend(values),
            scalar => items.push(scalar),
        }
    } else {
        match cursor.get(&leaf.name) {
            Some(Value::Object(_)) | Some(Value::Array(_)) => {
                return Err(conflict(&leaf.name));
            }
            // Duplicate scalar leaf: last column wins.
            _ => {
                cursor.insert(leaf.name.clone(), value);
            }
        }
    }

    Ok(())
}
