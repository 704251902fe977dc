//! Generic filtered-query engine.
//!
//! [`QueryBuilder`] turns [`QueryParameters`] into a [`Queryable`]: a source
//! plus a [`QueryPlan`] of filter, sort and page steps resolved against the
//! entity's field table. A [`QueryableWrapper`] materialises it. Stores
//! evaluate plans themselves (SQL for Postgres, [`QueryPlan::apply`] in
//! memory).

mod builder;
mod parameters;
pub mod resolver;
mod wrapper;

pub use builder::{Filter, QueryBuilder, QueryPlan, Queryable, Sort};
pub use parameters::{
    DEFAULT_ITEMS_ON_PAGE, DEFAULT_PAGE_NUMBER, Paging, QueryParameters, SortDirection,
};
pub use wrapper::{QueryableWrapper, SourceQueryableWrapper};
