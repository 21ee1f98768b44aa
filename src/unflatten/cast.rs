//! Schema-aware cell casting.
//!
//! Casting never fails hard: a cell that does not match its declared type
//! degrades to the raw value plus a [`DataWarning`], so one bad cell can
//! never abort a whole conversion.

use crate::types::{Cell, CellType, DataWarning, WarningKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};
use std::str::FromStr;

static NUMERIC_LITERAL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?([eE][+-]?\d+)?$").unwrap());

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Result of casting one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CastOutcome {
    /// Blank cell: contributes no field at all.
    Empty,
    /// A typed (or passed-through) value.
    Value(Value),
}

/// Cast a raw cell under an optional declared type.
///
/// Precedence of the declared type (inline suffix over schema over untyped)
/// is the caller's concern; this function only applies one strategy. An
/// empty cell is empty under every declared type, including `array` — an
/// array-typed blank yields an absent field, never an empty list.
pub fn cast_cell(
    cell: &Cell,
    declared: Option<CellType>,
    array_delimiter: char,
    row: usize,
    column: &str,
    warnings: &mut Vec<DataWarning>,
) -> CastOutcome {
    if cell.is_empty() {
        return CastOutcome::Empty;
    }

    let value = match declared {
        None => raw_value(cell),
        Some(CellType::Integer) => cast_integer(cell, row, column, warnings),
        Some(CellType::Number) => cast_number(cell, row, column, warnings),
        Some(CellType::Boolean) => cast_boolean(cell, row, column, warnings),
        Some(CellType::Array) => cast_array(cell, array_delimiter),
        Some(CellType::String) => Value::String(raw_text(cell)),
    };
    CastOutcome::Value(value)
}

/// The cell as-is, with no type hint applied.
fn raw_value(cell: &Cell) -> Value {
    match cell {
        Cell::Text(s) => Value::String(s.clone()),
        Cell::Number(n) => Value::Number(n.clone()),
        Cell::Bool(b) => Value::Bool(*b),
        Cell::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
        Cell::Empty => Value::Null,
    }
}

/// Text rendering of a cell, for `string`-typed columns and fallbacks.
fn raw_text(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(n) => n.to_string(),
        Cell::Bool(b) => b.to_string(),
        Cell::Date(d) => d.format(DATE_FORMAT).to_string(),
        Cell::Empty => String::new(),
    }
}

fn cast_integer(cell: &Cell, row: usize, column: &str, warnings: &mut Vec<DataWarning>) -> Value {
    match cell {
        Cell::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return Value::Number(n.clone());
            }
            // Spreadsheet readers often deliver whole numbers as floats.
            if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    return Value::Number(Number::from(f as i64));
                }
            }
            type_warning(row, column, "integer", &n.to_string(), warnings);
            raw_value(cell)
        }
        Cell::Text(s) => match s.trim().parse::<i64>() {
            Ok(i) => Value::Number(Number::from(i)),
            Err(_) => {
                type_warning(row, column, "integer", s, warnings);
                Value::String(s.clone())
            }
        },
        other => {
            type_warning(row, column, "integer", &raw_text(other), warnings);
            raw_value(other)
        }
    }
}

fn cast_number(cell: &Cell, row: usize, column: &str, warnings: &mut Vec<DataWarning>) -> Value {
    match cell {
        Cell::Number(n) => Value::Number(n.clone()),
        Cell::Text(s) => {
            let trimmed = s.trim();
            // Parse through serde_json::Number so decimal-looking values
            // keep their exact representation.
            if NUMERIC_LITERAL_REGEX.is_match(trimmed) {
                if let Ok(n) = Number::from_str(trimmed) {
                    return Value::Number(n);
                }
            }
            type_warning(row, column, "number", s, warnings);
            Value::String(s.clone())
        }
        other => {
            type_warning(row, column, "number", &raw_text(other), warnings);
            raw_value(other)
        }
    }
}

fn cast_boolean(cell: &Cell, row: usize, column: &str, warnings: &mut Vec<DataWarning>) -> Value {
    match cell {
        Cell::Bool(b) => Value::Bool(*b),
        Cell::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Value::Bool(true),
            "false" | "0" | "no" => Value::Bool(false),
            _ => {
                type_warning(row, column, "boolean", s, warnings);
                Value::String(s.clone())
            }
        },
        Cell::Number(n) => match n.as_i64() {
            Some(1) => Value::Bool(true),
            Some(0) => Value::Bool(false),
            _ => {
                type_warning(row, column, "boolean", &n.to_string(), warnings);
                raw_value(cell)
            }
        },
        other => {
            type_warning(row, column, "boolean", &raw_text(other), warnings);
            raw_value(other)
        }
    }
}

/// An `:array`-typed scalar cell splits on the configured delimiter; pieces
/// stay strings. A non-text cell becomes a single-item list.
fn cast_array(cell: &Cell, delimiter: char) -> Value {
    match cell {
        Cell::Text(s) => Value::Array(
            s.split(delimiter)
                .map(|piece| Value::String(piece.trim().to_string()))
                .collect(),
        ),
        other => Value::Array(vec![raw_value(other)]),
    }
}

fn type_warning(
    row: usize,
    column: &str,
    expected: &str,
    raw: &str,
    warnings: &mut Vec<DataWarning>,
) {
    warnings.push(DataWarning {
        row,
        column: column.to_string(),
        kind: WarningKind::TypeCast,
        message: format!("could not cast '{raw}' as {expected}, passing through unchanged"),
    });
}
