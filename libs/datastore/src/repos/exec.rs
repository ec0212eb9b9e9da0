//! Shared execution helpers: bind a rendered statement's scalar list and run
//! it against the pool. Every dynamic statement in the repositories funnels
//! through here.

use std::collections::BTreeMap;

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{FromRow, PgPool, Postgres, Row};
use tracing::debug;

use crate::errors::{StoreError, StoreResult};
use crate::query::{
    aggregate_keys, build_aggregate, build_count, build_delete_many, build_group_by, build_select,
    AggregateResult, AggregateSpec, Filter, GroupByRow, ListQuery, Scalar,
};

/// Appends rendered scalars as positional binds, in order.
pub(crate) fn bind_scalars(
    mut query: Query<'_, Postgres, PgArguments>,
    binds: Vec<Scalar>,
) -> Query<'_, Postgres, PgArguments> {
    for value in binds {
        query = match value {
            Scalar::Bool(v) => query.bind(v),
            Scalar::Int(v) => query.bind(v),
            Scalar::Float(v) => query.bind(v),
            Scalar::Text(v) => query.bind(v),
            Scalar::TextArray(v) => query.bind(v),
            Scalar::Uuid(v) => query.bind(v),
            Scalar::DateTime(v) => query.bind(v),
            Scalar::Json(v) => query.bind(v),
        };
    }
    query
}

pub(crate) async fn fetch_many<T>(
    pool: &PgPool,
    table: &str,
    columns: &[&str],
    query: &ListQuery,
) -> StoreResult<Vec<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let (sql, binds) = build_select(table, columns, query)?;
    debug!(table, "find_many");
    let rows = bind_scalars(sqlx::query(&sql), binds)
        .fetch_all(pool)
        .await?;
    rows.iter()
        .map(|row| T::from_row(row).map_err(StoreError::Backend))
        .collect()
}

/// Runs an already-rendered statement and decodes at most one row.
pub(crate) async fn fetch_optional_as<T>(
    pool: &PgPool,
    sql: &str,
    binds: Vec<Scalar>,
) -> StoreResult<Option<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let row = bind_scalars(sqlx::query(sql), binds)
        .fetch_optional(pool)
        .await?;
    row.map(|r| T::from_row(&r).map_err(StoreError::Backend))
        .transpose()
}

pub(crate) async fn count(
    pool: &PgPool,
    table: &str,
    columns: &[&str],
    filter: Option<&Filter>,
) -> StoreResult<i64> {
    let (sql, binds) = build_count(table, columns, filter)?;
    let row = bind_scalars(sqlx::query(&sql), binds).fetch_one(pool).await?;
    row.try_get::<i64, _>(0).map_err(StoreError::Backend)
}

pub(crate) async fn delete_many(
    pool: &PgPool,
    table: &str,
    columns: &[&str],
    filter: Option<&Filter>,
) -> StoreResult<u64> {
    let (sql, binds) = build_delete_many(table, columns, filter)?;
    let result = bind_scalars(sqlx::query(&sql), binds).execute(pool).await?;
    let deleted = result.rows_affected();
    debug!(table, deleted, "delete_many");
    Ok(deleted)
}

fn read_values(
    row: &PgRow,
    spec: &AggregateSpec,
) -> StoreResult<(Option<i64>, BTreeMap<String, Option<f64>>)> {
    let count = if spec.count {
        Some(
            row.try_get::<i64, _>("agg_count")
                .map_err(StoreError::Backend)?,
        )
    } else {
        None
    };
    let mut values = BTreeMap::new();
    for key in aggregate_keys(spec) {
        let value = row
            .try_get::<Option<f64>, _>(key.as_str())
            .map_err(StoreError::Backend)?;
        values.insert(key, value);
    }
    Ok((count, values))
}

pub(crate) async fn aggregate(
    pool: &PgPool,
    table: &str,
    columns: &[&str],
    filter: Option<&Filter>,
    spec: &AggregateSpec,
) -> StoreResult<AggregateResult> {
    let (sql, binds) = build_aggregate(table, columns, filter, spec)?;
    let row = bind_scalars(sqlx::query(&sql), binds).fetch_one(pool).await?;
    let (count, values) = read_values(&row, spec)?;
    Ok(AggregateResult { count, values })
}

pub(crate) async fn group_by(
    pool: &PgPool,
    table: &str,
    columns: &[&str],
    by: &str,
    filter: Option<&Filter>,
    spec: &AggregateSpec,
) -> StoreResult<Vec<GroupByRow>> {
    let (sql, binds) = build_group_by(table, columns, by, filter, spec)?;
    let rows = bind_scalars(sqlx::query(&sql), binds)
        .fetch_all(pool)
        .await?;
    rows.iter()
        .map(|row| {
            let key = row
                .try_get::<Option<String>, _>("group_key")
                .map_err(StoreError::Backend)?;
            let (count, values) = read_values(row, spec)?;
            Ok(GroupByRow { key, count, values })
        })
        .collect()
}
