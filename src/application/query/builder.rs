//! Composition of filter, sort and page steps into a store-agnostic plan.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::application::repos::QuerySource;
use crate::domain::{Entity, Field};

use super::parameters::{Paging, QueryParameters, SortDirection};
use super::resolver;

/// Case-insensitive "contains" over one or more fields, OR-combined.
pub struct Filter<T: 'static> {
    fields: Vec<&'static Field<T>>,
    term: String,
    needle: String,
}

impl<T: 'static> Filter<T> {
    fn new(fields: Vec<&'static Field<T>>, term: &str) -> Self {
        Self {
            fields,
            term: term.to_string(),
            needle: term.to_lowercase(),
        }
    }

    pub fn fields(&self) -> &[&'static Field<T>] {
        &self.fields
    }

    /// The term as the caller sent it.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// The term lowercased once, as every match compares it.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self, item: &T) -> bool {
        self.fields
            .iter()
            .any(|field| field.read(item).contains_lowercase(&self.needle))
    }
}

impl<T: 'static> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            term: self.term.clone(),
            needle: self.needle.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("fields", &self.fields)
            .field("term", &self.term)
            .finish()
    }
}

/// Single-key ordering.
pub struct Sort<T: 'static> {
    field: &'static Field<T>,
    direction: SortDirection,
}

impl<T: 'static> Sort<T> {
    pub fn field(&self) -> &'static Field<T> {
        self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        let ordering = self.field.read(a).cmp(&self.field.read(b));
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl<T: 'static> Clone for Sort<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for Sort<T> {}

impl<T: 'static> fmt::Debug for Sort<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sort")
            .field("field", &self.field.name())
            .field("direction", &self.direction)
            .finish()
    }
}

/// Filter, then sort, then page. The order is fixed; a plan only records
/// which steps are present.
pub struct QueryPlan<T: 'static> {
    filter: Option<Filter<T>>,
    sort: Option<Sort<T>>,
    paging: Option<Paging>,
}

impl<T: 'static> QueryPlan<T> {
    /// The whole collection in source order.
    pub fn all() -> Self {
        Self {
            filter: None,
            sort: None,
            paging: None,
        }
    }

    pub fn filter(&self) -> Option<&Filter<T>> {
        self.filter.as_ref()
    }

    pub fn sort(&self) -> Option<&Sort<T>> {
        self.sort.as_ref()
    }

    pub fn paging(&self) -> Option<Paging> {
        self.paging
    }

    /// Same filter and sort, every page.
    pub fn unpaged(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            sort: self.sort,
            paging: None,
        }
    }

    pub fn is_match(&self, item: &T) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter.matches(item))
    }

    /// Evaluate the plan against an in-memory sequence in source order.
    pub fn apply(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let mut rows: Vec<T> = items.into_iter().filter(|item| self.is_match(item)).collect();

        if let Some(sort) = &self.sort {
            // stable: ties keep source order
            rows.sort_by(|a, b| sort.compare(a, b));
        }

        match self.paging {
            Some(paging) => rows
                .into_iter()
                .skip(to_usize(paging.skip()))
                .take(to_usize(paging.take()))
                .collect(),
            None => rows,
        }
    }

    /// Rows the filter accepts, ignoring sort and paging.
    pub fn count_matching<'a>(&self, items: impl IntoIterator<Item = &'a T>) -> u64
    where
        T: 'a,
    {
        items.into_iter().filter(|item| self.is_match(item)).count() as u64
    }
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

impl<T: 'static> Clone for QueryPlan<T> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            sort: self.sort,
            paging: self.paging,
        }
    }
}

impl<T: 'static> Default for QueryPlan<T> {
    fn default() -> Self {
        Self::all()
    }
}

impl<T: 'static> fmt::Debug for QueryPlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryPlan")
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("paging", &self.paging)
            .finish()
    }
}

/// A composed, not yet materialised query: where rows come from plus the plan
/// to evaluate there.
pub struct Queryable<T: Entity> {
    source: Arc<dyn QuerySource<T>>,
    plan: QueryPlan<T>,
}

impl<T: Entity> Queryable<T> {
    pub fn new(source: Arc<dyn QuerySource<T>>) -> Self {
        Self {
            source,
            plan: QueryPlan::all(),
        }
    }

    pub fn source(&self) -> &Arc<dyn QuerySource<T>> {
        &self.source
    }

    pub fn plan(&self) -> &QueryPlan<T> {
        &self.plan
    }

    fn with_plan(&self, plan: QueryPlan<T>) -> Self {
        Self {
            source: self.source.clone(),
            plan,
        }
    }
}

impl<T: Entity> Clone for Queryable<T> {
    fn clone(&self) -> Self {
        self.with_plan(self.plan.clone())
    }
}

impl<T: Entity> fmt::Debug for Queryable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queryable")
            .field("entity", &T::NAME)
            .field("plan", &self.plan)
            .finish()
    }
}

/// Turns [`QueryParameters`] into a [`Queryable`] over a base collection.
pub struct QueryBuilder<T: Entity> {
    base: Queryable<T>,
}

impl<T: Entity> QueryBuilder<T> {
    pub fn new(base: Queryable<T>) -> Self {
        Self { base }
    }

    /// Build the plan for `parameters`. Unknown field names leave the
    /// corresponding step out instead of failing.
    pub fn execute(&self, parameters: &QueryParameters) -> Queryable<T> {
        let plan = QueryPlan {
            filter: build_filter::<T>(parameters),
            sort: build_sort::<T>(parameters),
            paging: Some(parameters.paging()),
        };
        self.base.with_plan(plan)
    }
}

fn build_filter<T: Entity>(parameters: &QueryParameters) -> Option<Filter<T>> {
    let term = parameters.search_string.as_str();
    if term.is_empty() {
        return None;
    }

    if !parameters.search_by.trim().is_empty() {
        return match resolver::resolve::<T>(&parameters.search_by) {
            Some(field) => Some(Filter::new(vec![field], term)),
            None => {
                debug!(
                    entity = T::NAME,
                    search_by = %parameters.search_by,
                    "unknown search field; filter skipped"
                );
                None
            }
        };
    }

    let fields: Vec<_> = T::default_search_fields()
        .iter()
        .filter_map(|name| resolver::resolve::<T>(name))
        .collect();
    if fields.is_empty() {
        debug!(entity = T::NAME, "no default search fields; filter skipped");
        return None;
    }
    Some(Filter::new(fields, term))
}

fn build_sort<T: Entity>(parameters: &QueryParameters) -> Option<Sort<T>> {
    if parameters.sort_by.trim().is_empty() {
        return None;
    }

    match resolver::resolve::<T>(&parameters.sort_by) {
        Some(field) => Some(Sort {
            field,
            direction: parameters.sort_direction,
        }),
        None => {
            debug!(
                entity = T::NAME,
                sort_by = %parameters.sort_by,
                "unknown sort field; source order kept"
            );
            None
        }
    }
}
