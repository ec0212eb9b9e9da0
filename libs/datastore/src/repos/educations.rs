use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};
use crate::models::{Education, EducationPatch, NewEducation};
use crate::query::{AggregateResult, AggregateSpec, Filter, GroupByRow, ListQuery, Scalar};

use super::exec;
use super::patch::PatchBuilder;

const TABLE: &str = "educations";
const COLUMNS: &[&str] = &[
    "id",
    "institution",
    "degree",
    "field",
    "start_date",
    "end_date",
    "current",
    "gpa",
    "description",
    "user_id",
    "created_at",
    "updated_at",
];

const INSERT: &str = r#"
    INSERT INTO educations
        (id, institution, degree, field, start_date, end_date, current, gpa, description, user_id)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
"#;

/// Repository for education entries.
#[derive(Clone)]
pub struct EducationRepo {
    pool: PgPool,
}

impl EducationRepo {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_unique(&self, id: Uuid) -> StoreResult<Option<Education>> {
        Ok(
            sqlx::query_as::<_, Education>("SELECT * FROM educations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn find_many(&self, query: &ListQuery) -> StoreResult<Vec<Education>> {
        exec::fetch_many(&self.pool, TABLE, COLUMNS, query).await
    }

    pub async fn create(&self, data: NewEducation) -> StoreResult<Education> {
        self.insert_with(Uuid::new_v4(), &data, "", Vec::new()).await
    }

    pub async fn update(&self, id: Uuid, patch: EducationPatch) -> StoreResult<Education> {
        let builder = build_patch(patch);
        if builder.is_empty() {
            return Err(StoreError::Validation(
                "empty patch for Education".to_string(),
            ));
        }
        let (sets, mut binds) = builder.render(1);
        binds.push(Scalar::Uuid(id));
        let sql = format!(
            "UPDATE educations SET {sets}, updated_at = NOW() WHERE id = ${} RETURNING *",
            binds.len()
        );
        exec::fetch_optional_as::<Education>(&self.pool, &sql, binds)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "Education",
            })
    }

    pub async fn upsert(
        &self,
        id: Uuid,
        data: NewEducation,
        update: EducationPatch,
    ) -> StoreResult<Education> {
        let builder = build_patch(update);
        let (sets, extra) = if builder.is_empty() {
            ("updated_at = NOW()".to_string(), Vec::new())
        } else {
            let (sets, binds) = builder.render(11);
            (format!("{sets}, updated_at = NOW()"), binds)
        };
        let on_conflict = format!(" ON CONFLICT (id) DO UPDATE SET {sets}");
        self.insert_with(id, &data, &on_conflict, extra).await
    }

    pub async fn delete(&self, id: Uuid) -> StoreResult<Education> {
        sqlx::query_as::<_, Education>("DELETE FROM educations WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "Education",
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
        data: &NewEducation,
        on_conflict: &str,
        extra: Vec<Scalar>,
    ) -> StoreResult<Education> {
        let sql = format!("{INSERT}{on_conflict} RETURNING *");
        let query = sqlx::query(&sql)
            .bind(id)
            .bind(&data.institution)
            .bind(&data.degree)
            .bind(&data.field)
            .bind(data.start_date)
            .bind(data.end_date)
            .bind(data.current)
            .bind(data.gpa)
            .bind(&data.description)
            .bind(data.user_id);
        let row = exec::bind_scalars(query, extra).fetch_one(&self.pool).await?;
        Education::from_row(&row).map_err(StoreError::Backend)
    }
}

fn build_patch(patch: EducationPatch) -> PatchBuilder {
    let mut b = PatchBuilder::new();
    if let Some(v) = patch.institution {
        b.set("institution", v);
    }
    if let Some(v) = patch.degree {
        b.set("degree", v);
    }
    if let Some(v) = patch.field {
        b.set("field", v);
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
    if let Some(v) = patch.gpa {
        b.set_nullable("gpa", v);
    }
    if let Some(v) = patch.description {
        b.set_nullable("description", v);
    }
    b
}
