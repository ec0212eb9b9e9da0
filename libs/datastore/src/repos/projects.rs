use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};
use crate::models::{NewProject, Project, ProjectPatch};
use crate::query::{AggregateResult, AggregateSpec, Filter, GroupByRow, ListQuery, Scalar};

use super::exec;
use super::patch::PatchBuilder;

const TABLE: &str = "projects";
const COLUMNS: &[&str] = &[
    "id",
    "name",
    "description",
    "url",
    "github",
    "technologies",
    "status",
    "start_date",
    "end_date",
    "user_id",
    "created_at",
    "updated_at",
];

const INSERT: &str = r#"
    INSERT INTO projects
        (id, name, description, url, github, technologies, status, start_date, end_date, user_id)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
"#;

/// Repository for portfolio projects.
#[derive(Clone)]
pub struct ProjectRepo {
    pool: PgPool,
}

impl ProjectRepo {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_unique(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(
            sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn find_many(&self, query: &ListQuery) -> StoreResult<Vec<Project>> {
        exec::fetch_many(&self.pool, TABLE, COLUMNS, query).await
    }

    pub async fn create(&self, data: NewProject) -> StoreResult<Project> {
        self.insert_with(Uuid::new_v4(), &data, "", Vec::new()).await
    }

    pub async fn update(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<Project> {
        let builder = build_patch(patch);
        if builder.is_empty() {
            return Err(StoreError::Validation(
                "empty patch for Project".to_string(),
            ));
        }
        let (sets, mut binds) = builder.render(1);
        binds.push(Scalar::Uuid(id));
        let sql = format!(
            "UPDATE projects SET {sets}, updated_at = NOW() WHERE id = ${} RETURNING *",
            binds.len()
        );
        exec::fetch_optional_as::<Project>(&self.pool, &sql, binds)
            .await?
            .ok_or(StoreError::NotFound { entity: "Project" })
    }

    pub async fn upsert(
        &self,
        id: Uuid,
        data: NewProject,
        update: ProjectPatch,
    ) -> StoreResult<Project> {
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

    pub async fn delete(&self, id: Uuid) -> StoreResult<Project> {
        sqlx::query_as::<_, Project>("DELETE FROM projects WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "Project" })
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
        data: &NewProject,
        on_conflict: &str,
        extra: Vec<Scalar>,
    ) -> StoreResult<Project> {
        let sql = format!("{INSERT}{on_conflict} RETURNING *");
        let query = sqlx::query(&sql)
            .bind(id)
            .bind(&data.name)
            .bind(&data.description)
            .bind(&data.url)
            .bind(&data.github)
            .bind(&data.technologies)
            .bind(&data.status)
            .bind(data.start_date)
            .bind(data.end_date)
            .bind(data.user_id);
        let row = exec::bind_scalars(query, extra).fetch_one(&self.pool).await?;
        Project::from_row(&row).map_err(StoreError::Backend)
    }
}

fn build_patch(patch: ProjectPatch) -> PatchBuilder {
    let mut b = PatchBuilder::new();
    if let Some(v) = patch.name {
        b.set("name", v);
    }
    if let Some(v) = patch.description {
        b.set_nullable("description", v);
    }
    if let Some(v) = patch.url {
        b.set_nullable("url", v);
    }
    if let Some(v) = patch.github {
        b.set_nullable("github", v);
    }
    if let Some(v) = patch.technologies {
        b.set("technologies", v);
    }
    if let Some(v) = patch.status {
        b.set("status", v);
    }
    if let Some(v) = patch.start_date {
        b.set_nullable("start_date", v);
    }
    if let Some(v) = patch.end_date {
        b.set_nullable("end_date", v);
    }
    b
}
