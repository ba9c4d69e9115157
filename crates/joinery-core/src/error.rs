//! Error types for the diff engine.

/// Errors raised before any SQL is produced.
///
/// Every variant is a validation failure of the input tables; the differ
/// either returns a complete statement list or one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// Both the old and the new table are absent.
    #[error("Nothing to diff: both the old and the new table are absent")]
    NothingToDiff,

    /// The desired table declares no columns.
    #[error("Table '{0}' has no columns")]
    NoColumns(String),

    /// The desired table breaks a structural invariant.
    #[error("Table '{table}' is invalid: {message}")]
    InvalidTable {
        /// Table name.
        table: String,
        /// What is wrong with it.
        message: String,
    },

    /// A column has no column at the ordinal position right before it.
    #[error("Column '{column}' at position {position} has no predecessor")]
    MissingPredecessor {
        /// Column name.
        column: String,
        /// Ordinal position of the column.
        position: u32,
    },

    /// The same table name appears twice in one side of a schema diff.
    #[error("Table '{0}' is declared more than once")]
    DuplicateTable(String),
}

impl DiffError {
    pub(crate) fn invalid(table: &str, message: impl Into<String>) -> Self {
        Self::InvalidTable {
            table: table.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for diff operations.
pub type Result<T> = std::result::Result<T, DiffError>;
