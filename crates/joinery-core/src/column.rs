//! Column model and column-level SQL rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, Result};
use crate::nullable::{NullInt64, NullString};
use crate::quote::{quote_identifier, quote_string};

/// Data-type categories whose default values are string literals.
const QUOTED_DEFAULT_TYPES: &[&str] = &[
    "char",
    "varchar",
    "binary",
    "varbinary",
    "tinyblob",
    "blob",
    "mediumblob",
    "longblob",
    "tinytext",
    "text",
    "mediumtext",
    "longtext",
    "enum",
    "set",
    "date",
    "datetime",
    "timestamp",
    "time",
    "year",
];

/// Categories that accept a bare `CURRENT_TIMESTAMP` default.
const TIMESTAMP_TYPES: &[&str] = &["datetime", "timestamp"];

/// The key role MySQL reports for a column (`COLUMN_KEY`).
///
/// Derived from the table's keys; informational only and never diffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyRole {
    /// Part of the primary key.
    #[serde(rename = "PRI")]
    Primary,
    /// First column of a unique key.
    #[serde(rename = "UNI")]
    Unique,
    /// First column of a non-unique key.
    #[serde(rename = "MUL")]
    Multiple,
    /// Not the leading column of any key.
    #[default]
    #[serde(rename = "")]
    None,
}

impl KeyRole {
    /// Parses a `COLUMN_KEY` value; anything unknown maps to `None`.
    #[must_use]
    pub fn from_catalog(value: &str) -> Self {
        match value {
            "PRI" => Self::Primary,
            "UNI" => Self::Unique,
            "MUL" => Self::Multiple,
            _ => Self::None,
        }
    }

    /// Returns the catalog spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "PRI",
            Self::Unique => "UNI",
            Self::Multiple => "MUL",
            Self::None => "",
        }
    }

    /// Returns `true` for [`KeyRole::None`].
    #[must_use]
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Where an added column lands: `first` or `after <column>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// Leftmost column.
    First,
    /// Right after the named column.
    After(String),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::After(name) => write!(f, "after {}", quote_identifier(name)),
        }
    }
}

/// One column of a table, as read from the catalog or a schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column name, unique within its table.
    pub name: String,
    /// 1-based physical position.
    pub ordinal_position: u32,
    /// Full declared type, e.g. `varchar(64)` or `int(11) unsigned`.
    pub sql_type: String,
    /// Type category, e.g. `varchar` or `datetime`.
    #[serde(rename = "dataTypeCategory")]
    pub data_type: String,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default value; NULL means no default clause.
    #[serde(default)]
    pub default: NullString,
    /// Whether `default` is an expression MySQL evaluates, rendered verbatim.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default_expression: bool,
    /// Whether the column is `auto_increment`.
    #[serde(default)]
    pub auto_increment: bool,
    /// Key role reported by the catalog.
    #[serde(default, skip_serializing_if = "KeyRole::is_none")]
    pub key_role: KeyRole,
    /// Character set; NULL means inherited and never diffed.
    #[serde(default)]
    pub charset: NullString,
    /// Collation, set together with `charset`.
    #[serde(default)]
    pub collation: NullString,
    /// Comment; empty means none.
    #[serde(default)]
    pub comment: String,
    /// `CHARACTER_MAXIMUM_LENGTH`.
    #[serde(default, skip_serializing_if = "NullInt64::is_null")]
    pub character_maximum_length: NullInt64,
    /// `CHARACTER_OCTET_LENGTH`.
    #[serde(default, skip_serializing_if = "NullInt64::is_null")]
    pub character_octet_length: NullInt64,
    /// `NUMERIC_PRECISION`.
    #[serde(default, skip_serializing_if = "NullInt64::is_null")]
    pub numeric_precision: NullInt64,
    /// `NUMERIC_SCALE`.
    #[serde(default, skip_serializing_if = "NullInt64::is_null")]
    pub numeric_scale: NullInt64,
}

impl Column {
    /// Creates a nullable column without default, charset or comment.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        ordinal_position: u32,
        sql_type: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ordinal_position,
            sql_type: sql_type.into(),
            data_type: data_type.into(),
            nullable: true,
            default: NullString::null(),
            default_expression: false,
            auto_increment: false,
            key_role: KeyRole::None,
            charset: NullString::null(),
            collation: NullString::null(),
            comment: String::new(),
            character_maximum_length: NullInt64::null(),
            character_octet_length: NullInt64::null(),
            numeric_precision: NullInt64::null(),
            numeric_scale: NullInt64::null(),
        }
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets a literal default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = NullString::new(value.into());
        self.default_expression = false;
        self
    }

    /// Sets an expression default, e.g. `(uuid())`.
    #[must_use]
    pub fn default_expression(mut self, expression: impl Into<String>) -> Self {
        self.default = NullString::new(expression.into());
        self.default_expression = true;
        self
    }

    /// Sets the column to auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the character set and collation.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>, collation: impl Into<String>) -> Self {
        self.charset = NullString::new(charset.into());
        self.collation = NullString::new(collation.into());
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Sets the key role tag.
    #[must_use]
    pub const fn key_role(mut self, role: KeyRole) -> Self {
        self.key_role = role;
        self
    }

    /// Returns `true` if the column has a default value.
    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.default.is_valid()
    }

    /// Returns `true` if the column carries its own character set.
    #[must_use]
    pub const fn has_charset(&self) -> bool {
        self.charset.is_valid()
    }

    /// Returns `true` if the column has a comment.
    #[must_use]
    pub fn has_comment(&self) -> bool {
        !self.comment.is_empty()
    }

    /// Renders the default value for a `default` clause, quoting it when
    /// the type category takes string literals.
    ///
    /// Expression defaults are rendered verbatim, and so is
    /// `CURRENT_TIMESTAMP[(n)]` on `datetime` and `timestamp` columns.
    #[must_use]
    pub fn format_default(&self) -> Option<String> {
        let value = self.default.as_str()?;
        if self.default_expression {
            return Some(value.to_string());
        }
        let category = self.data_type.to_ascii_lowercase();
        if TIMESTAMP_TYPES.contains(&category.as_str()) && is_current_timestamp(value) {
            return Some(value.to_string());
        }
        if QUOTED_DEFAULT_TYPES.contains(&category.as_str()) {
            Some(quote_string(value))
        } else {
            Some(value.to_string())
        }
    }

    /// Renders the column-definition fragment shared by `create table`,
    /// `add` and `modify`.
    #[must_use]
    pub fn render_definition(&self) -> String {
        let mut tokens = vec![quote_identifier(&self.name), self.sql_type.clone()];
        if !self.nullable {
            tokens.push("not null".to_string());
        }
        if let Some(default) = self.format_default() {
            tokens.push("default".to_string());
            tokens.push(default);
        }
        if self.auto_increment {
            tokens.push("auto_increment".to_string());
        }
        if self.has_comment() {
            tokens.push("comment".to_string());
            tokens.push(quote_string(&self.comment));
        }
        tokens.join(" ")
    }

    /// Renders an `add` clause placing the column at `position`.
    #[must_use]
    pub fn render_add(&self, position: &Position) -> String {
        format!("add {} {position}", self.render_definition())
    }

    /// Renders a `drop` clause.
    #[must_use]
    pub fn render_drop(&self) -> String {
        format!("drop {}", quote_identifier(&self.name))
    }

    /// Renders a `modify` clause. Never repositions the column.
    #[must_use]
    pub fn render_modify(&self) -> String {
        format!("modify {}", self.render_definition())
    }

    /// Renders a `modify` clause that only changes character set and
    /// collation.
    #[must_use]
    pub fn render_modify_charset(&self) -> String {
        format!(
            "modify {} {} character set {} collate {}",
            quote_identifier(&self.name),
            self.sql_type,
            self.charset,
            self.collation
        )
    }

    /// Computes the position clause for this column among `columns`, the
    /// columns of the table it is being added to.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::MissingPredecessor`] when no column sits at the
    /// ordinal position right before this one.
    pub fn compute_position(&self, columns: &[Column]) -> Result<Position> {
        if self.ordinal_position == 1 {
            return Ok(Position::First);
        }
        self.ordinal_position
            .checked_sub(1)
            .and_then(|before| columns.iter().find(|c| c.ordinal_position == before))
            .map(|prev| Position::After(prev.name.clone()))
            .ok_or_else(|| DiffError::MissingPredecessor {
                column: self.name.clone(),
                position: self.ordinal_position,
            })
    }

    /// Returns `true` if `other` differs in any diffed attribute.
    ///
    /// Ordinal position and key role are not compared.
    #[must_use]
    pub fn is_changed(&self, other: &Self) -> bool {
        !(self.same_attributes(other) && self.same_charset(other))
    }

    /// Returns `true` if the only difference to `other` is the character
    /// set or collation.
    #[must_use]
    pub fn is_charset_change_only(&self, other: &Self) -> bool {
        self.same_attributes(other) && !self.same_charset(other)
    }

    fn same_attributes(&self, other: &Self) -> bool {
        self.sql_type == other.sql_type
            && self.nullable == other.nullable
            && self.format_default() == other.format_default()
            && self.auto_increment == other.auto_increment
            && self.comment == other.comment
    }

    // Inherited charsets (NULL on either side) are not compared.
    fn same_charset(&self, other: &Self) -> bool {
        if !(self.has_charset() && other.has_charset()) {
            return true;
        }
        self.charset == other.charset && self.collation == other.collation
    }
}

/// Returns `true` for `CURRENT_TIMESTAMP` and `CURRENT_TIMESTAMP(n)`.
#[must_use]
pub fn is_current_timestamp(value: &str) -> bool {
    let upper = value.to_ascii_uppercase();
    upper == "CURRENT_TIMESTAMP"
        || (upper.starts_with("CURRENT_TIMESTAMP(") && upper.ends_with(')'))
}
