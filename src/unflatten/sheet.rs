//! Sheet unflattening: grouping row fragments into completed records.
//!
//! A single forward pass over the rows. With a root identifier configured,
//! consecutive rows sharing its value (or leaving it blank) merge into one
//! top-level record; a change to a new non-empty value flushes the open
//! group. Memory stays bounded by the one in-flight group.

use crate::error::UnflattenResult;
use crate::schema::SchemaLookup;
use crate::types::{DataWarning, Row, UnflattenConfig};
use crate::unflatten::row::{RowFragment, RowUnflattener};
use serde_json::{Map, Value};

/// Unflattens an ordered sequence of rows into completed nested records.
pub struct SheetUnflattener<'s> {
    config: UnflattenConfig,
    schema: Option<&'s dyn SchemaLookup>,
}

impl<'s> SheetUnflattener<'s> {
    pub fn new(config: UnflattenConfig) -> Self {
        SheetUnflattener {
            config,
            schema: None,
        }
    }

    pub fn with_schema(config: UnflattenConfig, schema: &'s dyn SchemaLookup) -> Self {
        SheetUnflattener {
            config,
            schema: Some(schema),
        }
    }

    pub fn config(&self) -> &UnflattenConfig {
        &self.config
    }

    /// Lazily unflatten `rows`.
    ///
    /// The returned iterator yields each completed record as soon as no
    /// further row can extend it; it is a single pass and not restartable.
    /// Row-scoped errors come through as `Err` items and leave the open
    /// group untouched (only fully-validated fragments are merged).
    pub fn unflatten<I>(&self, rows: I) -> Records<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Row>,
    {
        Records {
            unflattener: RowUnflattener::new(&self.config, self.schema),
            config: &self.config,
            rows: rows.into_iter().enumerate(),
            group: None,
            warnings: Vec::new(),
        }
    }
}

/// The one open rollup group: root-id value (if any row declared one) plus
/// the record accumulated so far.
struct OpenGroup {
    key: Option<Value>,
    record: Map<String, Value>,
}

/// Lazy, ordered, finite sequence of completed records.
pub struct Records<'a, I: Iterator<Item = Row>> {
    unflattener: RowUnflattener<'a>,
    config: &'a UnflattenConfig,
    rows: std::iter::Enumerate<I>,
    group: Option<OpenGroup>,
    warnings: Vec<DataWarning>,
}

impl<'a, I: Iterator<Item = Row>> Records<'a, I> {
    /// Recoverable warnings collected so far (grows as rows are consumed).
    pub fn warnings(&self) -> &[DataWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<DataWarning> {
        std::mem::take(&mut self.warnings)
    }
}

impl<'a, I: Iterator<Item = Row>> Iterator for Records<'a, I> {
    type Item = UnflattenResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some((index, row)) = self.rows.next() else {
                // End of input: flush the final open group.
                return self
                    .group
                    .take()
                    .map(|group| Ok(Value::Object(group.record)));
            };

            let fragment = match self.unflattener.unflatten_row(&row, index, &mut self.warnings) {
                Ok(fragment) => fragment,
                Err(err) => return Some(Err(err)),
            };
            let row_id = self.unflattener.root_id_of(&fragment);
            let RowFragment::Record(record) = fragment else {
                continue;
            };

            if !self.config.root_id_enabled() {
                return Some(Ok(Value::Object(record)));
            }

            match self.group.as_mut() {
                None => {
                    self.group = Some(OpenGroup {
                        key: row_id,
                        record,
                    });
                }
                Some(group) => {
                    let continues = match (&group.key, &row_id) {
                        // Blank root id: the row extends the open group.
                        (_, None) => true,
                        (Some(current), Some(incoming)) => current == incoming,
                        (None, Some(_)) => false,
                    };
                    if continues {
                        merge_fragment(&mut group.record, record, self.config.merge_rollups);
                    } else {
                        let finished = std::mem::replace(
                            group,
                            OpenGroup {
                                key: row_id,
                                record,
                            },
                        );
                        return Some(Ok(Value::Object(finished.record)));
                    }
                }
            }
        }
    }
}

/// Deep-merge one row's fragment into a group accumulator.
///
/// Objects merge recursively by key, scalars overwrite, arrays append the
/// incoming items — except that with `merge_rollups` set, an incoming item
/// whose `id` matches an existing item's `id` merges into that item instead
/// of appending.
pub fn merge_fragment(
    accumulator: &mut Map<String, Value>,
    fragment: Map<String, Value>,
    merge_rollups: bool,
) {
    for (key, incoming) in fragment {
        match accumulator.get_mut(&key) {
            None => {
                accumulator.insert(key, incoming);
            }
            Some(existing) => match (existing, incoming) {
                (Value::Object(acc), Value::Object(frag)) => {
                    merge_fragment(acc, frag, merge_rollups);
                }
                (Value::Array(items), Value::Array(incoming_items)) => {
                    for item in incoming_items {
                        merge_array_item(items, item, merge_rollups);
                    }
                }
                (slot, incoming) => {
                    *slot = incoming;
                }
            },
        }
    }
}

fn merge_array_item(items: &mut Vec<Value>, item: Value, merge_rollups: bool) {
    match item {
        Value::Object(incoming) if merge_rollups => {
            let position = incoming.get("id").and_then(|id| {
                items.iter().position(
                    |existing| matches!(existing, Value::Object(map) if map.get("id") == Some(id)),
                )
            });
            match position {
                Some(index) => {
                    if let Value::Object(map) = &mut items[index] {
                        merge_fragment(map, incoming, merge_rollups);
                    }
                }
                None => items.push(Value::Object(incoming)),
            }
        }
        other => items.push(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;
    use serde_json::json;

    fn rows(data: &[&[(&str, &str)]]) -> Vec<Row> {
        data.iter()
            .map(|pairs| {
                Row::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), Cell::text(*v))))
            })
            .collect()
    }

    fn collect(config: UnflattenConfig, input: Vec<Row>) -> Vec<Value> {
        let unflattener = SheetUnflattener::new(config);
        unflattener
            .unflatten(input)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_root_id_disabled_yields_rows_independently() {
        let config = UnflattenConfig {
            root_id: String::new(),
            ..UnflattenConfig::default()
        };
        let input = rows(&[&[("id", "1")], &[("id", "2")]]);
        assert_eq!(
            collect(config, input),
            vec![json!({"id": "1"}), json!({"id": "2"})]
        );
    }

    #[test]
    fn test_shared_root_id_merges_array_items_in_row_order() {
        let input = rows(&[
            &[("ocid", "A"), ("testA[]/id", "1"), ("testA[]/testB", "x")],
            &[("ocid", "A"), ("testA[]/id", "2"), ("testA[]/testB", "y")],
        ]);
        assert_eq!(
            collect(UnflattenConfig::default(), input),
            vec![json!({
                "ocid": "A",
                "testA": [
                    {"id": "1", "testB": "x"},
                    {"id": "2", "testB": "y"}
                ]
            })]
        );
    }

    #[test]
    fn test_blank_root_id_continues_previous_group() {
        let input = rows(&[
            &[("ocid", "A"), ("items[]/id", "1")],
            &[("items[]/id", "2")],
            &[("ocid", "B"), ("items[]/id", "3")],
        ]);
        assert_eq!(
            collect(UnflattenConfig::default(), input),
            vec![
                json!({"ocid": "A", "items": [{"id": "1"}, {"id": "2"}]}),
                json!({"ocid": "B", "items": [{"id": "3"}]}),
            ]
        );
    }

    #[test]
    fn test_root_id_change_flushes_group() {
        let input = rows(&[
            &[("ocid", "A"), ("id", "1")],
            &[("ocid", "B"), ("id", "2")],
        ]);
        assert_eq!(
            collect(UnflattenConfig::default(), input),
            vec![
                json!({"ocid": "A", "id": "1"}),
                json!({"ocid": "B", "id": "2"}),
            ]
        );
    }

    #[test]
    fn test_empty_rows_are_skipped_between_groups() {
        let input = rows(&[
            &[("ocid", "A"), ("id", "1")],
            &[("ocid", ""), ("id", "")],
            &[("ocid", "B"), ("id", "2")],
        ]);
        assert_eq!(
            collect(UnflattenConfig::default(), input),
            vec![
                json!({"ocid": "A", "id": "1"}),
                json!({"ocid": "B", "id": "2"}),
            ]
        );
    }

    #[test]
    fn test_rollup_items_with_matching_id_merge_across_rows() {
        let input = rows(&[
            &[("ocid", "A"), ("testA[]/id", "1"), ("testA[]/testB", "x")],
            &[("ocid", "A"), ("testA[]/id", "1"), ("testA[]/testC", "y")],
        ]);
        assert_eq!(
            collect(UnflattenConfig::default(), input),
            vec![json!({
                "ocid": "A",
                "testA": [{"id": "1", "testB": "x", "testC": "y"}]
            })]
        );
    }

    #[test]
    fn test_rollup_merge_can_be_disabled() {
        let config = UnflattenConfig {
            merge_rollups: false,
            ..UnflattenConfig::default()
        };
        let input = rows(&[
            &[("ocid", "A"), ("testA[]/id", "1")],
            &[("ocid", "A"), ("testA[]/id", "1")],
        ]);
        assert_eq!(
            collect(config, input),
            vec![json!({"ocid": "A", "testA": [{"id": "1"}, {"id": "1"}]})]
        );
    }

    #[test]
    fn test_row_error_leaves_group_intact() {
        let input = rows(&[
            &[("ocid", "A"), ("id", "1")],
            // `a` is both a value and a parent: structural conflict.
            &[("a", "1"), ("a/b", "2")],
            &[("ocid", "A"), ("testA/testB", "3")],
        ]);
        let unflattener = SheetUnflattener::new(UnflattenConfig::default());
        let results: Vec<_> = unflattener.unflatten(input).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert_eq!(
            *results[1].as_ref().unwrap(),
            json!({"ocid": "A", "id": "1", "testA": {"testB": "3"}})
        );
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let mut acc = match json!({"a": {"x": 1}, "n": 1}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let frag = match json!({"a": {"y": 2}, "n": 2}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        merge_fragment(&mut acc, frag, true);
        assert_eq!(Value::Object(acc), json!({"a": {"x": 1, "y": 2}, "n": 2}));
    }

    #[test]
    fn test_laziness_bounded_by_one_group() {
        // The first record must be available before the iterator touches
        // rows of the second group's tail.
        let input = rows(&[
            &[("ocid", "A"), ("id", "1")],
            &[("ocid", "B"), ("id", "2")],
            &[("ocid", "B"), ("items[]/id", "3")],
        ]);
        let unflattener = SheetUnflattener::new(UnflattenConfig::default());
        let mut records = unflattener.unflatten(input);
        assert_eq!(
            records.next().unwrap().unwrap(),
            json!({"ocid": "A", "id": "1"})
        );
        assert_eq!(
            records.next().unwrap().unwrap(),
            json!({"ocid": "B", "id": "2", "items": [{"id": "3"}]})
        );
        assert!(records.next().is_none());
    }
}
