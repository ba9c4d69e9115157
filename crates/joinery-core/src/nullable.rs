//! NULL-aware scalar wrappers.
//!
//! A [`Nullable`] pairs a value with a validity flag so that SQL `NULL`
//! (or JSON `null`) stays distinct from a present zero value. Values are
//! decoded either from a driver row (`Option<T>`) or from a JSON document,
//! and compare equal whenever the underlying values are equal, whatever
//! the source was.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A scalar that may be NULL.
#[derive(Debug, Clone, Default)]
pub struct Nullable<T> {
    value: T,
    valid: bool,
}

/// A nullable string (`COLUMN_DEFAULT`, `CHARACTER_SET_NAME`, ...).
pub type NullString = Nullable<String>;

/// A nullable 64-bit integer (`CHARACTER_MAXIMUM_LENGTH`, ...).
pub type NullInt64 = Nullable<i64>;

impl<T> Nullable<T> {
    /// Creates a present (non-NULL) value.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self { value, valid: true }
    }

    /// Returns `true` unless the value is NULL.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns `true` if the value is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        !self.valid
    }

    /// Returns the value, or `None` when NULL.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.valid.then_some(&self.value)
    }
}

impl<T: Default> Nullable<T> {
    /// Creates a NULL value.
    #[must_use]
    pub fn null() -> Self {
        Self {
            value: T::default(),
            valid: false,
        }
    }

    /// Decodes a value read from a database driver row, where `None` is
    /// SQL `NULL`.
    #[must_use]
    pub fn from_row(value: Option<T>) -> Self {
        value.map_or_else(Self::null, Self::new)
    }
}

impl NullString {
    /// Returns the string, or `None` when NULL.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.get().map(String::as_str)
    }
}

impl<T: PartialEq> PartialEq for Nullable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl<T: Eq> Eq for Nullable<T> {}

impl<T: Default> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        Self::from_row(value)
    }
}

impl From<&str> for NullString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl<T: fmt::Display> fmt::Display for Nullable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => value.fmt(f),
            None => f.write_str("NULL"),
        }
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Default> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from_row)
    }
}
