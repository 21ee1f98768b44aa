//! # Ingot - Spreadsheet Row Casting Toolkit
//!
//! A library for unflattening: reconstructing nested, schema-typed JSON
//! documents from flat, spreadsheet-shaped rows whose columns are named by
//! slash-delimited paths (or by human-readable titles resolved through a
//! schema).
//!
//! ## Modules
//!
//! - **unflatten**: path parsing, cell casting, per-row reconstruction, and
//!   cross-row rollup grouping
//! - **schema**: the schema lookup seam and a bundled in-memory index
//!
//! ## Quick Start
//!
//! ```rust
//! use ingot::{Cell, Row, SheetUnflattener, UnflattenConfig};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let rows = vec![
//!     Row::from_pairs([
//!         ("ocid", Cell::text("A")),
//!         ("id:integer", Cell::text("1")),
//!         ("parties[]/name", Cell::text("Alice")),
//!     ]),
//!     Row::from_pairs([
//!         ("ocid", Cell::text("A")),
//!         ("parties[]/name", Cell::text("Bob")),
//!     ]),
//! ];
//!
//! let unflattener = SheetUnflattener::new(UnflattenConfig::default());
//! let records: Vec<_> = unflattener.unflatten(rows).collect::<Result<_, _>>()?;
//!
//! assert_eq!(records, vec![json!({
//!     "ocid": "A",
//!     "id": 1,
//!     "parties": [{"name": "Alice"}, {"name": "Bob"}]
//! })]);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde_json::Value;

pub mod error;
pub mod schema;
pub mod types;
pub mod unflatten;

// Re-export commonly used types for convenience
pub use error::{UnflattenError, UnflattenResult};
pub use schema::{SchemaIndex, SchemaLookup};
pub use types::{AddressingMode, Cell, CellType, DataWarning, Row, UnflattenConfig, WarningKind};
pub use unflatten::{Records, RowFragment, RowUnflattener, SheetUnflattener};

/// Records plus the warnings collected while producing them.
#[derive(Debug, Clone)]
pub struct UnflattenOutput {
    pub records: Vec<Value>,
    pub warnings: Vec<DataWarning>,
}

/// Main entry point: unflatten a whole row sequence eagerly.
///
/// Fails on the first row-scoped fatal error; use
/// [`SheetUnflattener::unflatten`] directly to handle errors per record or
/// to consume records lazily.
pub fn unflatten_all<I>(
    rows: I,
    config: UnflattenConfig,
    schema: Option<&dyn SchemaLookup>,
) -> Result<UnflattenOutput>
where
    I: IntoIterator<Item = Row>,
{
    let unflattener = match schema {
        Some(schema) => SheetUnflattener::with_schema(config, schema),
        None => SheetUnflattener::new(config),
    };
    let mut records_iter = unflattener.unflatten(rows);
    let mut records = Vec::new();
    for record in &mut records_iter {
        records.push(record.context("Failed to unflatten row")?);
    }
    let warnings = records_iter.take_warnings();
    Ok(UnflattenOutput { records, warnings })
}
