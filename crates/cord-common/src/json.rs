//! Tri-state JSON fields
//!
//! REST builders distinguish "field not supplied" from "field explicitly
//! null". `Maybe<T>` models both alongside a concrete value: serialization
//! drops `Absent` keys (via `skip_serializing_if`), emits `null` for
//! `Null`, and the value otherwise.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A JSON field that may be absent, explicitly null, or present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Maybe<T> {
    /// Field is not sent at all
    #[default]
    Absent,
    /// Field is sent as JSON `null`
    Null,
    /// Field is sent with a value
    Present(T),
}

impl<T> Maybe<T> {
    /// True when the field should be skipped during serialization
    #[inline]
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// True when the field carries a value
    #[inline]
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Borrow the contained value, if any
    #[must_use]
    pub const fn as_ref(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Convert into an `Option`, folding `Null` into `None`
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Map the contained value
    #[must_use]
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Maybe<U> {
        match self {
            Self::Present(value) => Maybe::Present(f(value)),
            Self::Null => Maybe::Null,
            Self::Absent => Maybe::Absent,
        }
    }
}

impl<T> From<Option<T>> for Maybe<T> {
    /// `Some` becomes `Present`; `None` becomes `Null` (an Option supplied
    /// by a caller is an explicit value, not an omission)
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Present(v),
            None => Self::Null,
        }
    }
}

impl<T> From<T> for Maybe<T> {
    fn from(value: T) -> Self {
        Self::Present(value)
    }
}

impl<T: Serialize> Serialize for Maybe<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            // Absent is normally skipped by `skip_serializing_if`; if it
            // reaches the serializer anyway it degrades to null
            Self::Absent | Self::Null => serializer.serialize_none(),
            Self::Present(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Maybe<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A field that is missing entirely never reaches this point
        // (callers pair Maybe with `#[serde(default)]`), so a plain
        // Option distinguishes null from a value.
        Ok(Option::<T>::deserialize(deserializer)?.map_or(Self::Null, Self::Present))
    }
}
