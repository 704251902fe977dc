//! Static field tables describing the shape of each registry record.
//!
//! A [`Field`] pairs a column name with a precompiled accessor, so the query
//! engine can filter and sort by a field named at runtime without any
//! per-call introspection.

use std::borrow::Cow;
use std::cmp::Ordering;

use time::Date;

/// Typed accessor for a single field of `T`.
enum Accessor<T> {
    Int(fn(&T) -> Option<i64>),
    Text(fn(&T) -> Option<&str>),
    Date(fn(&T) -> Option<Date>),
    Bool(fn(&T) -> Option<bool>),
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Accessor<T> {}

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Text,
    Date,
    Bool,
}

/// A named, readable field of a record type.
pub struct Field<T> {
    name: &'static str,
    identity: bool,
    accessor: Accessor<T>,
}

impl<T> Field<T> {
    /// The integer identity column, always named `id`.
    pub const fn identity(read: fn(&T) -> Option<i64>) -> Self {
        Self {
            name: "id",
            identity: true,
            accessor: Accessor::Int(read),
        }
    }

    pub const fn int(name: &'static str, read: fn(&T) -> Option<i64>) -> Self {
        Self {
            name,
            identity: false,
            accessor: Accessor::Int(read),
        }
    }

    pub const fn text(name: &'static str, read: fn(&T) -> Option<&str>) -> Self {
        Self {
            name,
            identity: false,
            accessor: Accessor::Text(read),
        }
    }

    pub const fn date(name: &'static str, read: fn(&T) -> Option<Date>) -> Self {
        Self {
            name,
            identity: false,
            accessor: Accessor::Date(read),
        }
    }

    pub const fn boolean(name: &'static str, read: fn(&T) -> Option<bool>) -> Self {
        Self {
            name,
            identity: false,
            accessor: Accessor::Bool(read),
        }
    }

    /// Canonical snake_case name, identical to the storage column.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    pub fn kind(&self) -> FieldKind {
        match self.accessor {
            Accessor::Int(_) => FieldKind::Int,
            Accessor::Text(_) => FieldKind::Text,
            Accessor::Date(_) => FieldKind::Date,
            Accessor::Bool(_) => FieldKind::Bool,
        }
    }

    pub fn read<'a>(&self, item: &'a T) -> FieldValue<'a> {
        match self.accessor {
            Accessor::Int(read) => FieldValue::Int(read(item)),
            Accessor::Text(read) => FieldValue::Text(read(item)),
            Accessor::Date(read) => FieldValue::Date(read(item)),
            Accessor::Bool(read) => FieldValue::Bool(read(item)),
        }
    }
}

impl<T> std::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("identity", &self.identity)
            .finish()
    }
}

/// A borrowed field value. `None` inside a variant is a typed NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Int(Option<i64>),
    Text(Option<&'a str>),
    Date(Option<Date>),
    Bool(Option<bool>),
}

impl<'a> FieldValue<'a> {
    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Int(value) => value.is_none(),
            FieldValue::Text(value) => value.is_none(),
            FieldValue::Date(value) => value.is_none(),
            FieldValue::Bool(value) => value.is_none(),
        }
    }

    /// Text form used for "contains" matching. NULL has no text form.
    pub fn as_text(&self) -> Option<Cow<'a, str>> {
        match *self {
            FieldValue::Int(value) => value.map(|v| Cow::Owned(v.to_string())),
            FieldValue::Text(value) => value.map(Cow::Borrowed),
            FieldValue::Date(value) => value.map(|v| Cow::Owned(v.to_string())),
            FieldValue::Bool(value) => value.map(|v| Cow::Owned(v.to_string())),
        }
    }

    /// Case-insensitive containment against an already lowercased needle.
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        self.as_text()
            .is_some_and(|text| text.to_lowercase().contains(needle))
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Int(_) => 0,
            FieldValue::Text(_) => 1,
            FieldValue::Date(_) => 2,
            FieldValue::Bool(_) => 3,
        }
    }
}

impl Ord for FieldValue<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Option orders None before Some, which is the NULLS FIRST rule.
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for FieldValue<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
