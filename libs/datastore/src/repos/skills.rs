use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};
use crate::models::{NewSkill, Skill, SkillPatch};
use crate::query::{AggregateResult, AggregateSpec, Filter, GroupByRow, ListQuery, Scalar};

use super::exec;
use super::patch::PatchBuilder;

const TABLE: &str = "skills";
const COLUMNS: &[&str] = &[
    "id",
    "name",
    "category",
    "level",
    "verified",
    "years_of_exp",
    "user_id",
    "created_at",
    "updated_at",
];

const INSERT: &str = r#"
    INSERT INTO skills (id, name, category, level, verified, years_of_exp, user_id)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

/// Repository for `skills`. A skill name is unique per user; upserts key on
/// the `(user_id, name)` pair.
#[derive(Clone)]
pub struct SkillRepo {
    pool: PgPool,
}

impl SkillRepo {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_unique(&self, id: Uuid) -> StoreResult<Option<Skill>> {
        Ok(
            sqlx::query_as::<_, Skill>("SELECT * FROM skills WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Lookup on the secondary unique key.
    pub async fn find_by_user_and_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> StoreResult<Option<Skill>> {
        Ok(
            sqlx::query_as::<_, Skill>("SELECT * FROM skills WHERE user_id = $1 AND name = $2")
                .bind(user_id)
                .bind(name)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn find_many(&self, query: &ListQuery) -> StoreResult<Vec<Skill>> {
        exec::fetch_many(&self.pool, TABLE, COLUMNS, query).await
    }

    pub async fn create(&self, data: NewSkill) -> StoreResult<Skill> {
        debug!(user_id = %data.user_id, name = %data.name, "creating skill");
        Ok(
            sqlx::query_as::<_, Skill>(&format!("{INSERT} RETURNING *"))
                .bind(Uuid::new_v4())
                .bind(&data.name)
                .bind(&data.category)
                .bind(data.level)
                .bind(data.verified)
                .bind(data.years_of_exp)
                .bind(data.user_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    pub async fn update(&self, id: Uuid, patch: SkillPatch) -> StoreResult<Skill> {
        let builder = build_patch(patch);
        if builder.is_empty() {
            return Err(StoreError::Validation("empty patch for Skill".to_string()));
        }
        let (sets, mut binds) = builder.render(1);
        binds.push(Scalar::Uuid(id));
        let sql = format!(
            "UPDATE skills SET {sets}, updated_at = NOW() WHERE id = ${} RETURNING *",
            binds.len()
        );
        exec::fetch_optional_as::<Skill>(&self.pool, &sql, binds)
            .await?
            .ok_or(StoreError::NotFound { entity: "Skill" })
    }

    /// Creates the skill, or applies `update` to the row already holding
    /// this user's skill of the same name.
    pub async fn upsert(&self, data: NewSkill, update: SkillPatch) -> StoreResult<Skill> {
        let builder = build_patch(update);
        let (sets, extra) = if builder.is_empty() {
            ("updated_at = NOW()".to_string(), Vec::new())
        } else {
            let (sets, binds) = builder.render(8);
            (format!("{sets}, updated_at = NOW()"), binds)
        };
        let sql = format!("{INSERT} ON CONFLICT (user_id, name) DO UPDATE SET {sets} RETURNING *");
        let query = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&data.name)
            .bind(&data.category)
            .bind(data.level)
            .bind(data.verified)
            .bind(data.years_of_exp)
            .bind(data.user_id);
        let row = exec::bind_scalars(query, extra).fetch_one(&self.pool).await?;
        Skill::from_row(&row).map_err(StoreError::Backend)
    }

    pub async fn delete(&self, id: Uuid) -> StoreResult<Skill> {
        sqlx::query_as::<_, Skill>("DELETE FROM skills WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "Skill" })
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
}

fn build_patch(patch: SkillPatch) -> PatchBuilder {
    let mut b = PatchBuilder::new();
    if let Some(v) = patch.name {
        b.set("name", v);
    }
    if let Some(v) = patch.category {
        b.set_nullable("category", v);
    }
    if let Some(v) = patch.level {
        b.set("level", v);
    }
    if let Some(v) = patch.verified {
        b.set("verified", v);
    }
    if let Some(v) = patch.years_of_exp {
        b.set_nullable("years_of_exp", v);
    }
    b
}
