//! Table model: the unit the differ compares.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::{DiffError, Result};
use crate::key::{Key, KeyKind, PRIMARY_KEY_NAME};
use crate::quote::quote_identifier;

/// A read-only snapshot of one table's structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Schema (database) name.
    #[serde(default)]
    pub schema: String,
    /// Table name.
    pub name: String,
    /// Storage engine, e.g. `InnoDB`.
    pub engine: String,
    /// Default character set.
    pub charset: String,
    /// Columns, ordered by ordinal position.
    pub columns: Vec<Column>,
    /// Keys, in declaration order.
    #[serde(default)]
    pub keys: Vec<Key>,
}

impl Table {
    /// Creates an empty `InnoDB`/`utf8mb4` table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: String::new(),
            name: name.into(),
            engine: "InnoDB".to_string(),
            charset: "utf8mb4".to_string(),
            columns: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Sets the schema name.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Sets the storage engine.
    #[must_use]
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Sets the default character set.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds a key.
    #[must_use]
    pub fn key(mut self, key: Key) -> Self {
        self.keys.push(key);
        self
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Gets a key by name.
    #[must_use]
    pub fn get_key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.name == name)
    }

    /// Returns the columns sorted by ordinal position.
    #[must_use]
    pub fn columns_by_position(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.ordinal_position);
        columns
    }

    /// Checks the structural invariants the differ relies on.
    ///
    /// # Errors
    ///
    /// [`DiffError::NoColumns`] for an empty table, otherwise
    /// [`DiffError::InvalidTable`] describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(DiffError::NoColumns(self.name.clone()));
        }

        let mut names = HashSet::new();
        for column in &self.columns {
            if !names.insert(column.name.as_str()) {
                return Err(DiffError::invalid(
                    &self.name,
                    format!("duplicate column '{}'", column.name),
                ));
            }
            if column.charset.is_valid() != column.collation.is_valid() {
                return Err(DiffError::invalid(
                    &self.name,
                    format!(
                        "column '{}' must set character set and collation together",
                        column.name
                    ),
                ));
            }
        }

        for (expected, column) in (1..).zip(self.columns_by_position()) {
            if column.ordinal_position != expected {
                return Err(DiffError::invalid(
                    &self.name,
                    format!(
                        "column '{}' has ordinal position {}, expected {expected}",
                        column.name, column.ordinal_position
                    ),
                ));
            }
        }

        let mut key_names = HashSet::new();
        for key in &self.keys {
            if !key_names.insert(key.name.as_str()) {
                return Err(DiffError::invalid(
                    &self.name,
                    format!("duplicate key '{}'", key.name),
                ));
            }
            if key.columns.is_empty() {
                return Err(DiffError::invalid(
                    &self.name,
                    format!("key '{}' has no columns", key.name),
                ));
            }
            if (key.kind == KeyKind::Primary) != (key.name == PRIMARY_KEY_NAME) {
                return Err(DiffError::invalid(
                    &self.name,
                    format!("only the primary key may be named '{PRIMARY_KEY_NAME}'"),
                ));
            }
            if let Some(missing) = key.columns.iter().find(|c| !names.contains(c.as_str())) {
                return Err(DiffError::invalid(
                    &self.name,
                    format!("key '{}' references unknown column '{missing}'", key.name),
                ));
            }
        }

        Ok(())
    }

    /// Renders `create table if not exists` with every column in ordinal
    /// order followed by the primary, unique and plain keys.
    #[must_use]
    pub fn render_create(&self) -> String {
        let mut definitions: Vec<String> = self
            .columns_by_position()
            .into_iter()
            .map(Column::render_definition)
            .collect();
        for kind in [KeyKind::Primary, KeyKind::Unique, KeyKind::Plain] {
            definitions.extend(
                self.keys
                    .iter()
                    .filter(|k| k.kind == kind)
                    .map(Key::render_definition),
            );
        }
        format!(
            "create table if not exists {} (\n\t{}\n) engine={} default charset={}",
            quote_identifier(&self.name),
            definitions.join(",\n\t"),
            self.engine,
            self.charset
        )
    }

    /// Renders `drop table if exists`.
    #[must_use]
    pub fn render_drop(&self) -> String {
        format!("drop table if exists {}", quote_identifier(&self.name))
    }

    /// Wraps `clauses` into a single `alter table` statement.
    #[must_use]
    pub fn render_alter(&self, clauses: &[String]) -> String {
        format!(
            "alter table {}\n\t{}",
            quote_identifier(&self.name),
            clauses.join(",\n\t")
        )
    }
}
