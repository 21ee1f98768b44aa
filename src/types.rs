use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Number;
use std::fmt;

/// A single raw cell as delivered by a spreadsheet reader.
///
/// Cells are ephemeral: they are consumed during unflattening and never
/// mutated. `Empty` covers both a truly missing cell and an empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Blank cell, contributes nothing to the output.
    Empty,
    /// Text cell, passed through verbatim unless a type is declared.
    Text(String),
    /// Numeric cell. Kept as `serde_json::Number` so decimals stay exact.
    Number(Number),
    /// Boolean cell.
    Bool(bool),
    /// Date/datetime cell, rendered as ISO-8601 text in the output.
    Date(NaiveDateTime),
}

impl Cell {
    /// Whether this cell counts as blank for the "skip empty" rules.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }
}

impl From<serde_json::Value> for Cell {
    /// Converts an already-parsed JSON scalar into a cell. Containers are
    /// stringified; row sources are expected to deliver scalars only.
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Cell::Empty,
            Value::String(s) if s.is_empty() => Cell::Empty,
            Value::String(s) => Cell::Text(s),
            Value::Number(n) => Cell::Number(n),
            Value::Bool(b) => Cell::Bool(b),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// One flat row: an ordered mapping from column key to raw cell.
///
/// Column order is significant — it determines field insertion order in the
/// unflattened record — so this is a `Vec` of pairs, not a hash map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Row { cells: Vec::new() }
    }

    pub fn push(&mut self, column: impl Into<String>, cell: Cell) {
        self.cells.push((column.into(), cell));
    }

    /// Build a row from `(column, cell)` pairs, preserving their order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Cell)>,
        S: Into<String>,
    {
        Row {
            cells: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(String, Cell)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Cell)>>(iter: I) -> Self {
        Row {
            cells: iter.into_iter().collect(),
        }
    }
}

/// How column keys address fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressingMode {
    /// Canonical field paths, e.g. `a/b[]/id`.
    #[default]
    FieldNames,
    /// Human-readable titles resolved through a schema, e.g. `Title A:Title B`.
    Titles,
}

/// Declared cell type, from an inline `:type` column suffix or a schema.
///
/// This is the closed set of cast strategies; anything else is untyped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    Integer,
    Number,
    Boolean,
    Array,
    String,
}

impl CellType {
    /// Recognize an inline suffix token (`integer`, `number`, ...).
    pub fn from_suffix(token: &str) -> Option<Self> {
        match token {
            "integer" => Some(CellType::Integer),
            "number" => Some(CellType::Number),
            "boolean" => Some(CellType::Boolean),
            "array" => Some(CellType::Array),
            "string" => Some(CellType::String),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Integer => "integer",
            CellType::Number => "number",
            CellType::Boolean => "boolean",
            CellType::Array => "array",
            CellType::String => "string",
        }
    }
}

/// Configuration consumed by the unflattening core.
#[derive(Debug, Clone)]
pub struct UnflattenConfig {
    /// Field-name or title addressing for column keys.
    pub mode: AddressingMode,

    /// Root-identifier column name. An empty string disables cross-row
    /// grouping entirely.
    pub root_id: String,

    /// Title-mode token for the root-identifier column. Checked before the
    /// schema when resolving titles.
    pub root_id_title: Option<String>,

    /// Segment separator in field mode.
    pub path_separator: char,

    /// Segment separator in title mode.
    pub title_separator: char,

    /// Delimiter used to split `:array`-typed scalar cells.
    pub array_delimiter: char,

    /// When true, an array item arriving from a later row with a matching
    /// `id` merges into the existing item instead of appending.
    pub merge_rollups: bool,
}

impl Default for UnflattenConfig {
    fn default() -> Self {
        UnflattenConfig {
            mode: AddressingMode::FieldNames,
            root_id: String::from("ocid"),
            root_id_title: None,
            path_separator: '/',
            title_separator: ':',
            array_delimiter: ',',
            merge_rollups: true,
        }
    }
}

impl UnflattenConfig {
    pub fn root_id_enabled(&self) -> bool {
        !self.root_id.is_empty()
    }

    pub fn separator(&self) -> char {
        match self.mode {
            AddressingMode::FieldNames => self.path_separator,
            AddressingMode::Titles => self.title_separator,
        }
    }
}

/// Category of a recoverable data warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A declared type did not match the cell contents; the raw value was
    /// passed through instead.
    TypeCast,
    /// A title could not be resolved against the supplied schema and was
    /// used verbatim as a field name.
    UnresolvedTitle,
}

/// A recoverable, non-fatal problem encountered while unflattening.
///
/// Warnings never abort the conversion; they are collected for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataWarning {
    /// Zero-based index of the row in the input sequence.
    pub row: usize,
    /// The column key the warning applies to.
    pub column: String,
    pub kind: WarningKind,
    pub message: String,
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} column '{}': {}",
            self.row, self.column, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_emptiness() {
        assert!(Cell::Empty.is_empty());
        assert!(Cell::text("").is_empty());
        assert!(!Cell::text("x").is_empty());
        assert!(!Cell::Bool(false).is_empty());
    }

    #[test]
    fn test_row_preserves_order() {
        let row = Row::from_pairs([("b", Cell::text("1")), ("a", Cell::text("2"))]);
        let keys: Vec<&str> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_cell_type_suffixes() {
        assert_eq!(CellType::from_suffix("integer"), Some(CellType::Integer));
        assert_eq!(CellType::from_suffix("array"), Some(CellType::Array));
        assert_eq!(CellType::from_suffix("float"), None);
    }

    #[test]
    fn test_default_config() {
        let config = UnflattenConfig::default();
        assert_eq!(config.root_id, "ocid");
        assert!(config.root_id_enabled());
        assert_eq!(config.separator(), '/');
    }
}
