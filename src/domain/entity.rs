//! The minimal contract every registry record satisfies.

use std::fmt::Debug;

use crate::cache::CacheKey;

use super::fields::Field;

/// A record type the generic query engine, cache and handlers can work with.
///
/// Beyond an integer identity the shape is arbitrary; it is described to the
/// engine through the static table returned by [`Entity::fields`].
pub trait Entity: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Singular name used in logs and error messages.
    const NAME: &'static str;
    /// Backing table.
    const TABLE: &'static str;
    /// Key of the cached full collection for this type.
    const CACHE_KEY: CacheKey;

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Every field, identity first, in column order.
    fn fields() -> &'static [Field<Self>];

    /// Fields searched when a caller supplies a term but no field name.
    fn default_search_fields() -> &'static [&'static str] {
        &["name", "short_name"]
    }
}
