use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};
use crate::models::{ApiUsage, ApiUsagePatch, NewApiUsage};
use crate::query::{AggregateResult, AggregateSpec, Filter, GroupByRow, ListQuery, Scalar};

use super::exec;
use super::patch::PatchBuilder;

const TABLE: &str = "api_usage";
const COLUMNS: &[&str] = &[
    "id",
    "service",
    "endpoint",
    "tokens_used",
    "cost",
    "user_id",
    "success",
    "error_message",
    "created_at",
];

const INSERT: &str = r#"
    INSERT INTO api_usage (id, service, endpoint, tokens_used, cost, user_id, success, error_message)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
"#;

/// Repository for the standalone `api_usage` audit table. Rows have no
/// `updated_at` and no FK to users.
#[derive(Clone)]
pub struct ApiUsageRepo {
    pool: PgPool,
}

impl ApiUsageRepo {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_unique(&self, id: Uuid) -> StoreResult<Option<ApiUsage>> {
        Ok(
            sqlx::query_as::<_, ApiUsage>("SELECT * FROM api_usage WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn find_many(&self, query: &ListQuery) -> StoreResult<Vec<ApiUsage>> {
        exec::fetch_many(&self.pool, TABLE, COLUMNS, query).await
    }

    pub async fn create(&self, data: NewApiUsage) -> StoreResult<ApiUsage> {
        self.insert_with(Uuid::new_v4(), &data, "", Vec::new()).await
    }

    pub async fn update(&self, id: Uuid, patch: ApiUsagePatch) -> StoreResult<ApiUsage> {
        let builder = build_patch(patch);
        if builder.is_empty() {
            return Err(StoreError::Validation(
                "empty patch for ApiUsage".to_string(),
            ));
        }
        let (sets, mut binds) = builder.render(1);
        binds.push(Scalar::Uuid(id));
        let sql = format!(
            "UPDATE api_usage SET {sets} WHERE id = ${} RETURNING *",
            binds.len()
        );
        exec::fetch_optional_as::<ApiUsage>(&self.pool, &sql, binds)
            .await?
            .ok_or(StoreError::NotFound { entity: "ApiUsage" })
    }

    pub async fn upsert(
        &self,
        id: Uuid,
        data: NewApiUsage,
        update: ApiUsagePatch,
    ) -> StoreResult<ApiUsage> {
        let builder = build_patch(update);
        let (sets, extra) = if builder.is_empty() {
            // Nothing to change on conflict; DO UPDATE with the existing id
            // still returns the row, unlike DO NOTHING.
            ("id = EXCLUDED.id".to_string(), Vec::new())
        } else {
            builder.render(9)
        };
        let on_conflict = format!(" ON CONFLICT (id) DO UPDATE SET {sets}");
        self.insert_with(id, &data, &on_conflict, extra).await
    }

    pub async fn delete(&self, id: Uuid) -> StoreResult<ApiUsage> {
        sqlx::query_as::<_, ApiUsage>("DELETE FROM api_usage WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "ApiUsage" })
    }

    pub async fn delete_many(&self, filter: Option<&Filter>) -> StoreResult<u64> {
        exec::delete_many(&self.pool, TABLE, COLUMNS, filter).await
    }

    pub async fn count(&self, filter: Option<&Filter>) -> StoreResult<i64> {
        exec::count(&self.pool, TABLE, COLUMNS, filter).await
    }

    pub async fn aggregate(
        &self,
        filter: Option<&Filter>,
        spec: &AggregateSpec,
    ) -> StoreResult<AggregateResult> {
        exec::aggregate(&self.pool, TABLE, COLUMNS, filter, spec).await
    }

    pub async fn group_by(
        &self,
        by: &str,
        filter: Option<&Filter>,
        spec: &AggregateSpec,
    ) -> StoreResult<Vec<GroupByRow>> {
        exec::group_by(&self.pool, TABLE, COLUMNS, by, filter, spec).await
    }

    async fn insert_with(
        &self,
        id: Uuid,
        data: &NewApiUsage,
        on_conflict: &str,
        extra: Vec<Scalar>,
    ) -> StoreResult<ApiUsage> {
        let sql = format!("{INSERT}{on_conflict} RETURNING *");
        let query = sqlx::query(&sql)
            .bind(id)
            .bind(&data.service)
            .bind(&data.endpoint)
            .bind(data.tokens_used)
            .bind(data.cost)
            .bind(data.user_id)
            .bind(data.success)
            .bind(&data.error_message);
        let row = exec::bind_scalars(query, extra).fetch_one(&self.pool).await?;
        ApiUsage::from_row(&row).map_err(StoreError::Backend)
    }
}

fn build_patch(patch: ApiUsagePatch) -> PatchBuilder {
    let mut b = PatchBuilder::new();
    if let Some(v) = patch.service {
        b.set("service", v);
    }
    if let Some(v) = patch.endpoint {
        b.set("endpoint", v);
    }
    if let Some(v) = patch.tokens_used {
        b.set("tokens_used", v);
    }
    if let Some(v) = patch.cost {
        b.set("cost", v);
    }
    if let Some(v) = patch.user_id {
        b.set_nullable("user_id", v);
    }
    if let Some(v) = patch.success {
        b.set("success", v);
    }
    if let Some(v) = patch.error_message {
        b.set_nullable("error_message", v);
    }
    b
}
