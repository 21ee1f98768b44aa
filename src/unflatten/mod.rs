//! Unflattening - reconstruct nested records from flat, path-keyed rows.
//!
//! This module is the core of the crate: path parsing, schema-aware cell
//! casting, title resolution, per-row reconstruction, and the cross-row
//! rollup grouping that assembles completed top-level records.

pub mod cast;
pub mod path;
pub mod row;
pub mod sheet;
pub mod titles;

pub use cast::{cast_cell, CastOutcome};
pub use path::{parse_path, ParsedPath, PathSegment, TEXT_MARKER};
pub use row::{RowFragment, RowUnflattener};
pub use sheet::{merge_fragment, Records, SheetUnflattener};
pub use titles::TitleResolver;
