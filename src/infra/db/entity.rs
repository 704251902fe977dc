//! Generic table access driven by an entity's field table.
//!
//! Column names come only from the static field tables; caller-supplied text
//! is always bound.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::query::{Filter, QueryPlan, Queryable, Sort, SortDirection};
use crate::application::repos::{Change, PendingChanges, QuerySource, RepoError, Repository};
use crate::domain::{Entity, Field, FieldKind, FieldValue};
use crate::util::cancel::cancellable;

use super::util::{contains_pattern, map_sqlx_error};

/// An entity that can be decoded from a Postgres row.
pub trait PgEntity: Entity + for<'r> FromRow<'r, PgRow> {}

impl<T> PgEntity for T where T: Entity + for<'r> FromRow<'r, PgRow> {}

struct PgSource<T> {
    pool: PgPool,
    entity: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T: PgEntity> QuerySource<T> for PgSource<T> {
    async fn count(&self, plan: &QueryPlan<T>) -> Result<u64, RepoError> {
        let mut qb = count_query(plan);
        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn load(&self, plan: &QueryPlan<T>) -> Result<Vec<T>, RepoError> {
        let mut qb = select_query(plan);
        qb.build_query_as::<T>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

pub struct PgRepository<T> {
    source: Arc<PgSource<T>>,
}

impl<T: PgEntity> PgRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            source: Arc::new(PgSource {
                pool,
                entity: PhantomData,
            }),
        }
    }

    fn pool(&self) -> &PgPool {
        &self.source.pool
    }
}

impl<T> Clone for PgRepository<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

#[async_trait]
impl<T: PgEntity> Repository<T> for PgRepository<T> {
    async fn get_by_id(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, RepoError> {
        let mut qb = select_base::<T>();
        qb.push(" WHERE id = ");
        qb.push_bind(id);

        cancellable(cancel, async {
            qb.build_query_as::<T>()
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)
        })
        .await
    }

    async fn get_list(&self, cancel: &CancellationToken) -> Result<Vec<T>, RepoError> {
        cancellable(cancel, self.source.load(&QueryPlan::all())).await
    }

    async fn save_changes(
        &self,
        changes: PendingChanges<T>,
        cancel: &CancellationToken,
    ) -> Result<u64, RepoError> {
        if cancel.is_cancelled() {
            return Err(RepoError::Canceled);
        }
        if changes.is_empty() {
            return Ok(0);
        }

        let mut tx = cancellable(cancel, async {
            self.pool().begin().await.map_err(map_sqlx_error)
        })
        .await?;

        // Dropping the transaction on cancellation or error rolls it back.
        let affected = cancellable(cancel, apply_changes::<T>(&mut tx, changes)).await?;

        tx.commit().await.map_err(map_sqlx_error)?;
        debug!(entity = T::NAME, affected, "transaction committed");
        Ok(affected)
    }

    fn get_queryable(&self) -> Queryable<T> {
        Queryable::new(self.source.clone())
    }
}

async fn apply_changes<T: Entity>(
    conn: &mut PgConnection,
    changes: PendingChanges<T>,
) -> Result<u64, RepoError> {
    let mut affected = 0;
    for change in changes.into_inner() {
        let (mut qb, expect_row) = match &change {
            Change::Insert(entity) => (insert_query(entity), false),
            Change::Update(entity) => (update_query(entity), true),
            Change::Delete(id) => (delete_query::<T>(*id), true),
        };

        let rows = qb
            .build()
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
        if expect_row && rows == 0 {
            return Err(RepoError::NotFound);
        }
        affected += rows;
    }
    Ok(affected)
}

fn column_list<T: Entity>(include_identity: bool) -> String {
    T::fields()
        .iter()
        .filter(|field| include_identity || !field.is_identity())
        .map(Field::name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn select_base<'a, T: Entity>() -> QueryBuilder<'a, Postgres> {
    QueryBuilder::new(format!(
        "SELECT {} FROM {}",
        column_list::<T>(true),
        T::TABLE
    ))
}

fn select_query<'a, T: Entity>(plan: &QueryPlan<T>) -> QueryBuilder<'a, Postgres> {
    let mut qb = select_base::<T>();
    push_filter(&mut qb, plan.filter());
    push_order(&mut qb, plan.sort());
    if let Some(paging) = plan.paging() {
        qb.push(" LIMIT ");
        qb.push_bind(paging.take());
        qb.push(" OFFSET ");
        qb.push_bind(paging.skip());
    }
    qb
}

fn count_query<'a, T: Entity>(plan: &QueryPlan<T>) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", T::TABLE));
    push_filter(&mut qb, plan.filter());
    qb
}

fn push_filter<T: Entity>(qb: &mut QueryBuilder<'_, Postgres>, filter: Option<&Filter<T>>) {
    let Some(filter) = filter else {
        return;
    };

    // lowercase both sides the way in-memory matching does
    let pattern = contains_pattern(filter.needle());
    qb.push(" WHERE (");
    for (index, field) in filter.fields().iter().enumerate() {
        if index > 0 {
            qb.push(" OR ");
        }
        qb.push(format!("lower(CAST({} AS TEXT)) LIKE ", field.name()));
        qb.push_bind(pattern.clone());
        qb.push(r" ESCAPE '\'");
    }
    qb.push(")");
}

fn push_order<T: Entity>(qb: &mut QueryBuilder<'_, Postgres>, sort: Option<&Sort<T>>) {
    let Some(sort) = sort else {
        qb.push(" ORDER BY id");
        return;
    };

    let field = sort.field();
    qb.push(" ORDER BY ");
    qb.push(field.name());
    if field.kind() == FieldKind::Text {
        // byte order, matching the in-memory comparison
        qb.push(r#" COLLATE "C""#);
    }
    qb.push(match sort.direction() {
        SortDirection::Ascending => " ASC NULLS FIRST",
        SortDirection::Descending => " DESC NULLS LAST",
    });
    if !field.is_identity() {
        qb.push(", id ASC");
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: FieldValue<'_>) {
    match value {
        FieldValue::Int(value) => qb.push_bind(value),
        FieldValue::Text(value) => qb.push_bind(value.map(str::to_owned)),
        FieldValue::Date(value) => qb.push_bind(value),
        FieldValue::Bool(value) => qb.push_bind(value),
    };
}

fn insert_query<'a, T: Entity>(entity: &T) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        T::TABLE,
        column_list::<T>(false)
    ));
    for (index, field) in T::fields()
        .iter()
        .filter(|field| !field.is_identity())
        .enumerate()
    {
        if index > 0 {
            qb.push(", ");
        }
        push_value(&mut qb, field.read(entity));
    }
    qb.push(")");
    qb
}

fn update_query<'a, T: Entity>(entity: &T) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", T::TABLE));
    for (index, field) in T::fields()
        .iter()
        .filter(|field| !field.is_identity())
        .enumerate()
    {
        if index > 0 {
            qb.push(", ");
        }
        qb.push(format!("{} = ", field.name()));
        push_value(&mut qb, field.read(entity));
    }
    qb.push(" WHERE id = ");
    qb.push_bind(entity.id());
    qb
}

fn delete_query<'a, T: Entity>(id: i64) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("DELETE FROM {} WHERE id = ", T::TABLE));
    qb.push_bind(id);
    qb
}
