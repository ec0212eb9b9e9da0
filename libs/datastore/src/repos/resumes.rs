use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};
use crate::models::{NewResume, Resume, ResumePatch};
use crate::query::{AggregateResult, AggregateSpec, Filter, GroupByRow, ListQuery, Scalar};

use super::exec;
use super::patch::PatchBuilder;

const TABLE: &str = "resumes";
const COLUMNS: &[&str] = &[
    "id",
    "title",
    "template",
    "content",
    "pdf_url",
    "is_public",
    "user_id",
    "created_at",
    "updated_at",
];

const INSERT: &str = r#"
    INSERT INTO resumes (id, title, template, content, pdf_url, is_public, user_id)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

/// Repository for resume documents.
#[derive(Clone)]
pub struct ResumeRepo {
    pool: PgPool,
}

impl ResumeRepo {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_unique(&self, id: Uuid) -> StoreResult<Option<Resume>> {
        Ok(
            sqlx::query_as::<_, Resume>("SELECT * FROM resumes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn find_many(&self, query: &ListQuery) -> StoreResult<Vec<Resume>> {
        exec::fetch_many(&self.pool, TABLE, COLUMNS, query).await
    }

    pub async fn create(&self, data: NewResume) -> StoreResult<Resume> {
        self.insert_with(Uuid::new_v4(), &data, "", Vec::new()).await
    }

    pub async fn update(&self, id: Uuid, patch: ResumePatch) -> StoreResult<Resume> {
        let builder = build_patch(patch);
        if builder.is_empty() {
            return Err(StoreError::Validation("empty patch for Resume".to_string()));
        }
        let (sets, mut binds) = builder.render(1);
        binds.push(Scalar::Uuid(id));
        let sql = format!(
            "UPDATE resumes SET {sets}, updated_at = NOW() WHERE id = ${} RETURNING *",
            binds.len()
        );
        exec::fetch_optional_as::<Resume>(&self.pool, &sql, binds)
            .await?
            .ok_or(StoreError::NotFound { entity: "Resume" })
    }

    pub async fn upsert(
        &self,
        id: Uuid,
        data: NewResume,
        update: ResumePatch,
    ) -> StoreResult<Resume> {
        let builder = build_patch(update);
        let (sets, extra) = if builder.is_empty() {
            ("updated_at = NOW()".to_string(), Vec::new())
        } else {
            let (sets, binds) = builder.render(8);
            (format!("{sets}, updated_at = NOW()"), binds)
        };
        let on_conflict = format!(" ON CONFLICT (id) DO UPDATE SET {sets}");
        self.insert_with(id, &data, &on_conflict, extra).await
    }

    pub async fn delete(&self, id: Uuid) -> StoreResult<Resume> {
        sqlx::query_as::<_, Resume>("DELETE FROM resumes WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "Resume" })
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
        data: &NewResume,
        on_conflict: &str,
        extra: Vec<Scalar>,
    ) -> StoreResult<Resume> {
        let sql = format!("{INSERT}{on_conflict} RETURNING *");
        let query = sqlx::query(&sql)
            .bind(id)
            .bind(&data.title)
            .bind(&data.template)
            .bind(&data.content)
            .bind(&data.pdf_url)
            .bind(data.is_public)
            .bind(data.user_id);
        let row = exec::bind_scalars(query, extra).fetch_one(&self.pool).await?;
        Resume::from_row(&row).map_err(StoreError::Backend)
    }
}

fn build_patch(patch: ResumePatch) -> PatchBuilder {
    let mut b = PatchBuilder::new();
    if let Some(v) = patch.title {
        b.set("title", v);
    }
    if let Some(v) = patch.template {
        b.set("template", v);
    }
    if let Some(v) = patch.content {
        b.set("content", v);
    }
    if let Some(v) = patch.pdf_url {
        b.set_nullable("pdf_url", v);
    }
    if let Some(v) = patch.is_public {
        b.set("is_public", v);
    }
    b
}
