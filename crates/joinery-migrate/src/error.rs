//! Error types for the catalog, file and execution adapters.

use std::path::PathBuf;

use joinery_core::DiffError;

/// Errors that can occur while reading, diffing or applying schemas.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Database error while querying the catalog.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading/writing schema files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A schema file is not a valid table document.
    #[error("Failed to decode schema file '{path}': {source}")]
    Decode {
        /// Path to the schema file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Serialization error while writing a table document.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The tables could not be diffed.
    #[error("Diff error: {0}")]
    Diff(#[from] DiffError),

    /// The catalog returned rows that do not form a valid table.
    #[error("Inconsistent catalog: {0}")]
    Catalog(String),

    /// A statement failed; the ones before it were applied.
    #[error("Statement {index} failed: {source}\n{statement}")]
    Execution {
        /// Zero-based index of the failed statement.
        index: usize,
        /// The failed statement.
        statement: String,
        /// Driver error.
        source: sqlx::Error,
    },
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
