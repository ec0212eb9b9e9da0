use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};
use crate::models::{Experience, ExperiencePatch, NewExperience};
use crate::query::{AggregateResult, AggregateSpec, Filter, GroupByRow, ListQuery, Scalar};

use super::exec;
use super::patch::PatchBuilder;

const TABLE: &str = "experiences";
const COLUMNS: &[&str] = &[
    "id",
    "title",
    "company",
    "location",
    "start_date",
    "end_date",
    "current",
    "description",
    "achievements",
    "skills",
    "user_id",
    "created_at",
    "updated_at",
];

const INSERT: &str = r#"
    INSERT INTO experiences
        (id, title, company, location, start_date, end_date, current,
         description, achievements, skills, user_id)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
"#;

/// Repository for work experience entries.
#[derive(Clone)]
pub struct ExperienceRepo {
    pool: PgPool,
}

impl ExperienceRepo {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_unique(&self, id: Uuid) -> StoreResult<Option<Experience>> {
        Ok(
            sqlx::query_as::<_, Experience>("SELECT * FROM experiences WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn find_many(&self, query: &ListQuery) -> StoreResult<Vec<Experience>> {
        exec::fetch_many(&self.pool, TABLE, COLUMNS, query).await
    }

    pub async fn create(&self, data: NewExperience) -> StoreResult<Experience> {
        self.insert_with(Uuid::new_v4(), &data, "", Vec::new()).await
    }

    pub async fn update(&self, id: Uuid, patch: ExperiencePatch) -> StoreResult<Experience> {
        let builder = build_patch(patch);
        if builder.is_empty() {
            return Err(StoreError::Validation(
                "empty patch for Experience".to_string(),
            ));
        }
        let (sets, mut binds) = builder.render(1);
        binds.push(Scalar::Uuid(id));
        let sql = format!(
            "UPDATE experiences SET {sets}, updated_at = NOW() WHERE id = ${} RETURNING *",
            binds.len()
        );
        exec::fetch_optional_as::<Experience>(&self.pool, &sql, binds)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "Experience",
            })
    }

    /// Creates the row under the given id, or applies `update` if it exists.
    pub async fn upsert(
        &self,
        id: Uuid,
        data: NewExperience,
        update: ExperiencePatch,
    ) -> StoreResult<Experience> {
        let builder = build_patch(update);
        let (sets, extra) = if builder.is_empty() {
            ("updated_at = NOW()".to_string(), Vec::new())
        } else {
            let (sets, binds) = builder.render(12);
            (format!("{sets}, updated_at = NOW()"), binds)
        };
        let on_conflict = format!(" ON CONFLICT (id) DO UPDATE SET {sets}");
        self.insert_with(id, &data, &on_conflict, extra).await
    }

    pub async fn delete(&self, id: Uuid) -> StoreResult<Experience> {
        sqlx::query_as::<_, Experience>("DELETE FROM experiences WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "Experience",
            })
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
        data: &NewExperience,
        on_conflict: &str,
        extra: Vec<Scalar>,
    ) -> StoreResult<Experience> {
        let sql = format!("{INSERT}{on_conflict} RETURNING *");
        let query = sqlx::query(&sql)
            .bind(id)
            .bind(&data.title)
            .bind(&data.company)
            .bind(&data.location)
            .bind(data.start_date)
            .bind(data.end_date)
            .bind(data.current)
            .bind(&data.description)
            .bind(&data.achievements)
            .bind(&data.skills)
            .bind(data.user_id);
        let row = exec::bind_scalars(query, extra).fetch_one(&self.pool).await?;
        Experience::from_row(&row).map_err(StoreError::Backend)
    }
}

fn build_patch(patch: ExperiencePatch) -> PatchBuilder {
    let mut b = PatchBuilder::new();
    if let Some(v) = patch.title {
        b.set("title", v);
    }
    if let Some(v) = patch.company {
        b.set("company", v);
    }
    if let Some(v) = patch.location {
        b.set_nullable("location", v);
    }
    if let Some(v) = patch.start_date {
        b.set("start_date", v);
    }
    if let Some(v) = patch.end_date {
        b.set_nullable("end_date", v);
    }
    if let Some(v) = patch.current {
        b.set("current", v);
    }
    if let Some(v) = patch.description {
        b.set_nullable("description", v);
    }
    if let Some(v) = patch.achievements {
        b.set("achievements", v);
    }
    if let Some(v) = patch.skills {
        b.set("skills", v);
    }
    b
}
