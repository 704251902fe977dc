//! Query composition, request handlers and repository seams.

pub mod error;
pub mod handlers;
pub mod pagination;
pub mod query;
pub mod repos;
