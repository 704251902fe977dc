//! Cache key definitions.
//!
//! Each entity type owns exactly one key naming its cached full collection.
//! The table is fixed at compile time and never mutated.

use std::fmt;

/// Name of a cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(&'static str);

impl CacheKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub const CATEGORIES: CacheKey = CacheKey::new("Categories");
pub const GRADES: CacheKey = CacheKey::new("Grades");
pub const HOUSINGS: CacheKey = CacheKey::new("Housings");
pub const ROOMS: CacheKey = CacheKey::new("Rooms");
pub const EMPLOYEES: CacheKey = CacheKey::new("Employees");
pub const MATERIALS: CacheKey = CacheKey::new("Materials");
pub const MEASUREMENT_STANDARDS: CacheKey = CacheKey::new("MeasurementStandards");
pub const SERVICE_RECORDS: CacheKey = CacheKey::new("ServiceRecords");

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::domain::Entity;
    use crate::domain::entities::{
        Category, Employee, Grade, Housing, Material, MeasurementStandard, Room, ServiceRecord,
    };

    #[test]
    fn every_entity_owns_a_distinct_key() {
        let keys = [
            Category::CACHE_KEY,
            Grade::CACHE_KEY,
            Housing::CACHE_KEY,
            Room::CACHE_KEY,
            Employee::CACHE_KEY,
            Material::CACHE_KEY,
            MeasurementStandard::CACHE_KEY,
            ServiceRecord::CACHE_KEY,
        ];
        let names: HashSet<_> = keys.iter().map(CacheKey::as_str).collect();
        assert_eq!(names.len(), keys.len());
    }

    #[test]
    fn key_displays_its_name() {
        assert_eq!(HOUSINGS.to_string(), "Housings");
        assert_eq!(Housing::CACHE_KEY, HOUSINGS);
    }
}
