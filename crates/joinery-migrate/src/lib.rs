//! MySQL adapters for `joinery-core`.
//!
//! - **Catalog** - reads the current tables from `information_schema`
//! - **Schema files** - reads and writes the desired tables as JSON
//! - **Executor** - applies the diff statements, or prints them in dry-run
//!
//! # CLI Usage
//!
//! ```bash
//! # Dump the current tables of a schema
//! joinery --database mysql://root@localhost/app --schema app export -o schema.json
//!
//! # Show the statements that bring the database to schema.json
//! joinery --schema app build --input schema.json --dry-run
//!
//! # Apply them, dropping tables that are no longer declared
//! joinery --schema app build --input schema.json --with-drop
//! ```

pub mod catalog;
pub mod error;
pub mod executor;
pub mod schema_file;

use joinery_core::{DiffOptions, Differ, Table};

/// Plans the statements that turn the `current` tables into the `desired`
/// ones.
pub fn plan(
    current: &[Table],
    desired: &[Table],
    options: DiffOptions,
) -> error::Result<Vec<String>> {
    let statements = Differ::with_options(options).diff_schemas(current, desired)?;
    tracing::info!(statements = statements.len(), "Planned schema changes");
    Ok(statements)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::CatalogReader;
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::Executor;
    pub use crate::plan;
    pub use crate::schema_file::{read_tables, write_tables};
    pub use joinery_core::prelude::*;
}
