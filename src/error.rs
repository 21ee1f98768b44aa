use thiserror::Error;

/// Convenience result type for unflattening operations.
pub type UnflattenResult<T> = Result<T, UnflattenError>;

/// Fatal errors raised while unflattening.
///
/// Both variants are scoped to a single row: the offending row's fragment is
/// discarded and processing continues with the next row. Recoverable problems
/// (bad casts, unresolved titles) are reported as [`crate::DataWarning`]s
/// instead.
#[derive(Debug, Error)]
pub enum UnflattenError {
    /// A column key was empty (after trimming) and cannot address a field.
    #[error("row {row}: malformed column key '{column}'")]
    MalformedPath { row: usize, column: String },

    /// Two columns in one row implied both a scalar and a container at the
    /// same key (e.g. `a` and `a/b` both populated).
    #[error("row {row} column '{column}': '{key}' is used as both a value and a parent")]
    StructuralConflict {
        row: usize,
        column: String,
        key: String,
    },
}

impl UnflattenError {
    /// The zero-based input row the error occurred in.
    pub fn row(&self) -> usize {
        match self {
            UnflattenError::MalformedPath { row, .. } => *row,
            UnflattenError::StructuralConflict { row, .. } => *row,
        }
    }
}
