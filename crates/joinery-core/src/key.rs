//! Key (index) model and key-level SQL rendering.

use serde::{Deserialize, Serialize};

use crate::quote::quote_identifier;

/// Name MySQL gives the primary key.
pub const PRIMARY_KEY_NAME: &str = "PRIMARY";

/// Kind of key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// The primary key.
    Primary,
    /// A unique key.
    Unique,
    /// A plain, non-unique key.
    Plain,
}

/// A named index over an ordered list of columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Key name; [`PRIMARY_KEY_NAME`] for the primary key.
    pub name: String,
    /// Kind of key.
    pub kind: KeyKind,
    /// Participating columns, in index order.
    pub columns: Vec<String>,
}

impl Key {
    /// Creates a key.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: KeyKind,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates the primary key.
    #[must_use]
    pub fn primary(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(PRIMARY_KEY_NAME, KeyKind::Primary, columns)
    }

    /// Creates a unique key.
    #[must_use]
    pub fn unique(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::new(name, KeyKind::Unique, columns)
    }

    /// Creates a plain key.
    #[must_use]
    pub fn plain(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::new(name, KeyKind::Plain, columns)
    }

    /// Returns `true` for the primary key.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.kind == KeyKind::Primary
    }

    /// Returns `true` if the key covers `column`.
    #[must_use]
    pub fn references(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Returns `true` if `other` (a key of the same name) differs in kind
    /// or in its ordered column list.
    #[must_use]
    pub fn is_changed(&self, other: &Self) -> bool {
        self.kind != other.kind || self.columns != other.columns
    }

    fn column_list(&self) -> String {
        let quoted: Vec<String> = self.columns.iter().map(|c| quote_identifier(c)).collect();
        format!("({})", quoted.join(","))
    }

    /// Renders the key as it appears inside `create table`.
    #[must_use]
    pub fn render_definition(&self) -> String {
        match self.kind {
            KeyKind::Primary => format!("primary key {}", self.column_list()),
            KeyKind::Unique => format!(
                "unique key {} {}",
                quote_identifier(&self.name),
                self.column_list()
            ),
            KeyKind::Plain => {
                format!("key {} {}", quote_identifier(&self.name), self.column_list())
            }
        }
    }

    /// Renders an `add ... key` clause.
    #[must_use]
    pub fn render_add(&self) -> String {
        format!("add {}", self.render_definition())
    }

    /// Renders a `drop ... key` clause.
    #[must_use]
    pub fn render_drop(&self) -> String {
        if self.is_primary() {
            "drop primary key".to_string()
        } else {
            format!("drop key {}", quote_identifier(&self.name))
        }
    }
}
