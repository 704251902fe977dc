//! Runtime field-name resolution.
//!
//! Callers name fields as strings (`"ShortName"`, `"short_name"`). Each
//! (entity type, normalised name) pair is matched against the entity's static
//! field table once and the index memoised for the life of the process.
//! Unknown names are never memoised.

use std::any::TypeId;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::domain::{Entity, Field};

static RESOLVED: Lazy<DashMap<(TypeId, String), usize>> = Lazy::new(DashMap::new);

/// Lowercase, trimmed, underscores removed.
pub fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolve `name` to a field of `T`, or `None` if `T` has no such field.
pub fn resolve<T: Entity>(name: &str) -> Option<&'static Field<T>> {
    let normalized = normalize(name);
    if normalized.is_empty() {
        return None;
    }

    let fields = T::fields();
    let key = (TypeId::of::<T>(), normalized);
    if let Some(index) = RESOLVED.get(&key) {
        return fields.get(*index);
    }

    let index = fields
        .iter()
        .position(|field| normalize(field.name()) == key.1)?;
    RESOLVED.insert(key, index);
    fields.get(index)
}

#[cfg(test)]
fn is_memoized<T: Entity>(name: &str) -> bool {
    RESOLVED.contains_key(&(TypeId::of::<T>(), normalize(name)))
}
