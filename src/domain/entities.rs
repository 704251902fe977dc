//! Registry records mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::cache::keys;

use super::entity::Entity;
use super::fields::Field;

/// Classification applied to rooms (lecture hall, lab, storage, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub short_name: String,
}

/// Staff grade or rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Grade {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub short_name: String,
}

/// A building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Housing {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub floors: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Room {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub number: String,
    pub housing_id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub capacity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    #[serde(default)]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub grade_id: Option<i64>,
    #[serde(default)]
    pub hired_on: Option<Date>,
}

/// Consumable or stocked material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Material {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub unit: String,
    pub quantity: i64,
}

/// Reference standard used when calibrating measuring equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MeasurementStandard {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub code: String,
    #[serde(default)]
    pub valid_until: Option<Date>,
}

/// Maintenance or repair performed in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServiceRecord {
    #[serde(default)]
    pub id: i64,
    pub room_id: i64,
    #[serde(default)]
    pub employee_id: Option<i64>,
    pub description: String,
    pub performed_on: Date,
    #[serde(default)]
    pub completed: bool,
}

static CATEGORY_FIELDS: [Field<Category>; 3] = [
    Field::identity(|c| Some(c.id)),
    Field::text("name", |c| Some(c.name.as_str())),
    Field::text("short_name", |c| Some(c.short_name.as_str())),
];

static GRADE_FIELDS: [Field<Grade>; 3] = [
    Field::identity(|g| Some(g.id)),
    Field::text("name", |g| Some(g.name.as_str())),
    Field::text("short_name", |g| Some(g.short_name.as_str())),
];

static HOUSING_FIELDS: [Field<Housing>; 5] = [
    Field::identity(|h| Some(h.id)),
    Field::text("name", |h| Some(h.name.as_str())),
    Field::text("short_name", |h| Some(h.short_name.as_str())),
    Field::text("address", |h| h.address.as_deref()),
    Field::int("floors", |h| h.floors),
];

static ROOM_FIELDS: [Field<Room>; 6] = [
    Field::identity(|r| Some(r.id)),
    Field::text("name", |r| Some(r.name.as_str())),
    Field::text("number", |r| Some(r.number.as_str())),
    Field::int("housing_id", |r| Some(r.housing_id)),
    Field::int("category_id", |r| r.category_id),
    Field::int("capacity", |r| r.capacity),
];

static EMPLOYEE_FIELDS: [Field<Employee>; 6] = [
    Field::identity(|e| Some(e.id)),
    Field::text("first_name", |e| Some(e.first_name.as_str())),
    Field::text("last_name", |e| Some(e.last_name.as_str())),
    Field::text("email", |e| e.email.as_deref()),
    Field::int("grade_id", |e| e.grade_id),
    Field::date("hired_on", |e| e.hired_on),
];

static MATERIAL_FIELDS: [Field<Material>; 5] = [
    Field::identity(|m| Some(m.id)),
    Field::text("name", |m| Some(m.name.as_str())),
    Field::text("short_name", |m| Some(m.short_name.as_str())),
    Field::text("unit", |m| Some(m.unit.as_str())),
    Field::int("quantity", |m| Some(m.quantity)),
];

static MEASUREMENT_STANDARD_FIELDS: [Field<MeasurementStandard>; 5] = [
    Field::identity(|s| Some(s.id)),
    Field::text("name", |s| Some(s.name.as_str())),
    Field::text("short_name", |s| Some(s.short_name.as_str())),
    Field::text("code", |s| Some(s.code.as_str())),
    Field::date("valid_until", |s| s.valid_until),
];

static SERVICE_RECORD_FIELDS: [Field<ServiceRecord>; 6] = [
    Field::identity(|s| Some(s.id)),
    Field::int("room_id", |s| Some(s.room_id)),
    Field::int("employee_id", |s| s.employee_id),
    Field::text("description", |s| Some(s.description.as_str())),
    Field::date("performed_on", |s| Some(s.performed_on)),
    Field::boolean("completed", |s| Some(s.completed)),
];

impl Entity for Category {
    const NAME: &'static str = "category";
    const TABLE: &'static str = "categories";
    const CACHE_KEY: crate::cache::CacheKey = keys::CATEGORIES;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn fields() -> &'static [Field<Self>] {
        &CATEGORY_FIELDS
    }
}

impl Entity for Grade {
    const NAME: &'static str = "grade";
    const TABLE: &'static str = "grades";
    const CACHE_KEY: crate::cache::CacheKey = keys::GRADES;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn fields() -> &'static [Field<Self>] {
        &GRADE_FIELDS
    }
}

impl Entity for Housing {
    const NAME: &'static str = "housing";
    const TABLE: &'static str = "housings";
    const CACHE_KEY: crate::cache::CacheKey = keys::HOUSINGS;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn fields() -> &'static [Field<Self>] {
        &HOUSING_FIELDS
    }
}

impl Entity for Room {
    const NAME: &'static str = "room";
    const TABLE: &'static str = "rooms";
    const CACHE_KEY: crate::cache::CacheKey = keys::ROOMS;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn fields() -> &'static [Field<Self>] {
        &ROOM_FIELDS
    }

    fn default_search_fields() -> &'static [&'static str] {
        &["name", "number"]
    }
}

impl Entity for Employee {
    const NAME: &'static str = "employee";
    const TABLE: &'static str = "employees";
    const CACHE_KEY: crate::cache::CacheKey = keys::EMPLOYEES;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn fields() -> &'static [Field<Self>] {
        &EMPLOYEE_FIELDS
    }

    fn default_search_fields() -> &'static [&'static str] {
        &["first_name", "last_name", "email"]
    }
}

impl Entity for Material {
    const NAME: &'static str = "material";
    const TABLE: &'static str = "materials";
    const CACHE_KEY: crate::cache::CacheKey = keys::MATERIALS;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn fields() -> &'static [Field<Self>] {
        &MATERIAL_FIELDS
    }
}

impl Entity for MeasurementStandard {
    const NAME: &'static str = "measurement_standard";
    const TABLE: &'static str = "measurement_standards";
    const CACHE_KEY: crate::cache::CacheKey = keys::MEASUREMENT_STANDARDS;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn fields() -> &'static [Field<Self>] {
        &MEASUREMENT_STANDARD_FIELDS
    }
}

impl Entity for ServiceRecord {
    const NAME: &'static str = "service_record";
    const TABLE: &'static str = "service_records";
    const CACHE_KEY: crate::cache::CacheKey = keys::SERVICE_RECORDS;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn fields() -> &'static [Field<Self>] {
        &SERVICE_RECORD_FIELDS
    }

    fn default_search_fields() -> &'static [&'static str] {
        &["description"]
    }
}
