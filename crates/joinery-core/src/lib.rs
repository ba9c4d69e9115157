//! # joinery-core
//!
//! Structural diff of MySQL tables.
//!
//! Given the table as it currently exists and the table as it should be,
//! this crate produces the ordered DDL statements (`create table`,
//! `alter table`, `drop table`) that turn one into the other. It never
//! touches a database: tables come from the catalog reader or from schema
//! files in `joinery-migrate`.
//!
//! ```rust
//! use joinery_core::prelude::*;
//!
//! let old = Table::new("users")
//!     .column(Column::new("id", 1, "int(11)", "int").not_null())
//!     .key(Key::primary(["id"]));
//! let new = old
//!     .clone()
//!     .column(Column::new("email", 2, "varchar(255)", "varchar").not_null())
//!     .key(Key::unique("email", ["email"]));
//!
//! let statements = diff(Some(&old), Some(&new)).unwrap();
//! assert_eq!(
//!     statements,
//!     vec![
//!         "alter table `users`\n\
//!          \tadd `email` varchar(255) not null after `id`,\n\
//!          \tadd unique key `email` (`email`)"
//!     ]
//! );
//! ```

pub mod column;
pub mod differ;
pub mod error;
pub mod key;
pub mod nullable;
pub mod quote;
pub mod table;

pub use column::{Column, KeyRole, Position, is_current_timestamp};
pub use differ::{DiffOptions, Differ, diff};
pub use error::{DiffError, Result};
pub use key::{Key, KeyKind, PRIMARY_KEY_NAME};
pub use nullable::{NullInt64, NullString, Nullable};
pub use table::Table;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::column::{Column, KeyRole, Position};
    pub use crate::differ::{DiffOptions, Differ, diff};
    pub use crate::error::{DiffError, Result};
    pub use crate::key::{Key, KeyKind};
    pub use crate::nullable::{NullInt64, NullString, Nullable};
    pub use crate::table::Table;
}
