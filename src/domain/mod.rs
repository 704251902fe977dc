//! Domain layer: the record contract, field tables and concrete registry records.

pub mod entities;
pub mod entity;
pub mod fields;

pub use entity::Entity;
pub use fields::{Field, FieldKind, FieldValue};
