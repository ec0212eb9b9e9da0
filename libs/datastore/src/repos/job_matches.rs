use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};
use crate::models::{JobMatch, JobMatchPatch, NewJobMatch};
use crate::query::{AggregateResult, AggregateSpec, Filter, GroupByRow, ListQuery, Scalar};

use super::exec;
use super::patch::PatchBuilder;

const TABLE: &str = "job_matches";
const COLUMNS: &[&str] = &[
    "id",
    "job_title",
    "company",
    "job_description",
    "requirements",
    "location",
    "salary_range",
    "job_url",
    "match_score",
    "match_reasons",
    "missing_skills",
    "ai_analysis",
    "applied",
    "user_id",
    "created_at",
    "updated_at",
];

const INSERT: &str = r#"
    INSERT INTO job_matches
        (id, job_title, company, job_description, requirements, location, salary_range,
         job_url, match_score, match_reasons, missing_skills, ai_analysis, applied, user_id)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
"#;

/// Repository for scored job matches.
#[derive(Clone)]
pub struct JobMatchRepo {
    pool: PgPool,
}

impl JobMatchRepo {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_unique(&self, id: Uuid) -> StoreResult<Option<JobMatch>> {
        Ok(
            sqlx::query_as::<_, JobMatch>("SELECT * FROM job_matches WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn find_many(&self, query: &ListQuery) -> StoreResult<Vec<JobMatch>> {
        exec::fetch_many(&self.pool, TABLE, COLUMNS, query).await
    }

    pub async fn create(&self, data: NewJobMatch) -> StoreResult<JobMatch> {
        self.insert_with(Uuid::new_v4(), &data, "", Vec::new()).await
    }

    pub async fn update(&self, id: Uuid, patch: JobMatchPatch) -> StoreResult<JobMatch> {
        let builder = build_patch(patch);
        if builder.is_empty() {
            return Err(StoreError::Validation(
                "empty patch for JobMatch".to_string(),
            ));
        }
        let (sets, mut binds) = builder.render(1);
        binds.push(Scalar::Uuid(id));
        let sql = format!(
            "UPDATE job_matches SET {sets}, updated_at = NOW() WHERE id = ${} RETURNING *",
            binds.len()
        );
        exec::fetch_optional_as::<JobMatch>(&self.pool, &sql, binds)
            .await?
            .ok_or(StoreError::NotFound { entity: "JobMatch" })
    }

    pub async fn upsert(
        &self,
        id: Uuid,
        data: NewJobMatch,
        update: JobMatchPatch,
    ) -> StoreResult<JobMatch> {
        let builder = build_patch(update);
        let (sets, extra) = if builder.is_empty() {
            ("updated_at = NOW()".to_string(), Vec::new())
        } else {
            let (sets, binds) = builder.render(15);
            (format!("{sets}, updated_at = NOW()"), binds)
        };
        let on_conflict = format!(" ON CONFLICT (id) DO UPDATE SET {sets}");
        self.insert_with(id, &data, &on_conflict, extra).await
    }

    pub async fn delete(&self, id: Uuid) -> StoreResult<JobMatch> {
        sqlx::query_as::<_, JobMatch>("DELETE FROM job_matches WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "JobMatch" })
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
        data: &NewJobMatch,
        on_conflict: &str,
        extra: Vec<Scalar>,
    ) -> StoreResult<JobMatch> {
        let sql = format!("{INSERT}{on_conflict} RETURNING *");
        let query = sqlx::query(&sql)
            .bind(id)
            .bind(&data.job_title)
            .bind(&data.company)
            .bind(&data.job_description)
            .bind(&data.requirements)
            .bind(&data.location)
            .bind(&data.salary_range)
            .bind(&data.job_url)
            .bind(data.match_score)
            .bind(&data.match_reasons)
            .bind(&data.missing_skills)
            .bind(&data.ai_analysis)
            .bind(data.applied)
            .bind(data.user_id);
        let row = exec::bind_scalars(query, extra).fetch_one(&self.pool).await?;
        JobMatch::from_row(&row).map_err(StoreError::Backend)
    }
}

fn build_patch(patch: JobMatchPatch) -> PatchBuilder {
    let mut b = PatchBuilder::new();
    if let Some(v) = patch.job_title {
        b.set("job_title", v);
    }
    if let Some(v) = patch.company {
        b.set("company", v);
    }
    if let Some(v) = patch.job_description {
        b.set("job_description", v);
    }
    if let Some(v) = patch.requirements {
        b.set("requirements", v);
    }
    if let Some(v) = patch.location {
        b.set_nullable("location", v);
    }
    if let Some(v) = patch.salary_range {
        b.set_nullable("salary_range", v);
    }
    if let Some(v) = patch.job_url {
        b.set_nullable("job_url", v);
    }
    if let Some(v) = patch.match_score {
        b.set("match_score", v);
    }
    if let Some(v) = patch.match_reasons {
        b.set("match_reasons", v);
    }
    if let Some(v) = patch.missing_skills {
        b.set("missing_skills", v);
    }
    if let Some(v) = patch.ai_analysis {
        b.set_nullable("ai_analysis", v);
    }
    if let Some(v) = patch.applied {
        b.set("applied", v);
    }
    b
}
