use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};
use crate::models::{NewPsychologicalProfile, PsychologicalProfile, PsychologicalProfilePatch};
use crate::query::{AggregateResult, AggregateSpec, Filter, GroupByRow, ListQuery, Scalar};

use super::exec;
use super::patch::PatchBuilder;

const TABLE: &str = "psychological_profiles";
const COLUMNS: &[&str] = &[
    "id",
    "personality_type",
    "big_five_scores",
    "work_preferences",
    "motivation_factors",
    "stress_factors",
    "communication_style",
    "learning_style",
    "career_goals",
    "strengths_weaknesses",
    "completed_at",
    "user_id",
    "created_at",
    "updated_at",
];

const INSERT: &str = r#"
    INSERT INTO psychological_profiles
        (id, personality_type, big_five_scores, work_preferences, motivation_factors,
         stress_factors, communication_style, learning_style, career_goals,
         strengths_weaknesses, completed_at, user_id)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
"#;

/// Repository for psychological assessment profiles.
#[derive(Clone)]
pub struct ProfileRepo {
    pool: PgPool,
}

impl ProfileRepo {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_unique(&self, id: Uuid) -> StoreResult<Option<PsychologicalProfile>> {
        Ok(sqlx::query_as::<_, PsychologicalProfile>(
            "SELECT * FROM psychological_profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn find_many(&self, query: &ListQuery) -> StoreResult<Vec<PsychologicalProfile>> {
        exec::fetch_many(&self.pool, TABLE, COLUMNS, query).await
    }

    pub async fn create(&self, data: NewPsychologicalProfile) -> StoreResult<PsychologicalProfile> {
        self.insert_with(Uuid::new_v4(), &data, "", Vec::new()).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: PsychologicalProfilePatch,
    ) -> StoreResult<PsychologicalProfile> {
        let builder = build_patch(patch);
        if builder.is_empty() {
            return Err(StoreError::Validation(
                "empty patch for PsychologicalProfile".to_string(),
            ));
        }
        let (sets, mut binds) = builder.render(1);
        binds.push(Scalar::Uuid(id));
        let sql = format!(
            "UPDATE psychological_profiles SET {sets}, updated_at = NOW() \
             WHERE id = ${} RETURNING *",
            binds.len()
        );
        exec::fetch_optional_as::<PsychologicalProfile>(&self.pool, &sql, binds)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "PsychologicalProfile",
            })
    }

    pub async fn upsert(
        &self,
        id: Uuid,
        data: NewPsychologicalProfile,
        update: PsychologicalProfilePatch,
    ) -> StoreResult<PsychologicalProfile> {
        let builder = build_patch(update);
        let (sets, extra) = if builder.is_empty() {
            ("updated_at = NOW()".to_string(), Vec::new())
        } else {
            let (sets, binds) = builder.render(13);
            (format!("{sets}, updated_at = NOW()"), binds)
        };
        let on_conflict = format!(" ON CONFLICT (id) DO UPDATE SET {sets}");
        self.insert_with(id, &data, &on_conflict, extra).await
    }

    pub async fn delete(&self, id: Uuid) -> StoreResult<PsychologicalProfile> {
        sqlx::query_as::<_, PsychologicalProfile>(
            "DELETE FROM psychological_profiles WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "PsychologicalProfile",
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
        data: &NewPsychologicalProfile,
        on_conflict: &str,
        extra: Vec<Scalar>,
    ) -> StoreResult<PsychologicalProfile> {
        let sql = format!("{INSERT}{on_conflict} RETURNING *");
        let query = sqlx::query(&sql)
            .bind(id)
            .bind(&data.personality_type)
            .bind(&data.big_five_scores)
            .bind(&data.work_preferences)
            .bind(&data.motivation_factors)
            .bind(&data.stress_factors)
            .bind(&data.communication_style)
            .bind(&data.learning_style)
            .bind(&data.career_goals)
            .bind(&data.strengths_weaknesses)
            .bind(data.completed_at)
            .bind(data.user_id);
        let row = exec::bind_scalars(query, extra).fetch_one(&self.pool).await?;
        PsychologicalProfile::from_row(&row).map_err(StoreError::Backend)
    }
}

fn build_patch(patch: PsychologicalProfilePatch) -> PatchBuilder {
    let mut b = PatchBuilder::new();
    if let Some(v) = patch.personality_type {
        b.set_nullable("personality_type", v);
    }
    if let Some(v) = patch.big_five_scores {
        b.set_nullable("big_five_scores", v);
    }
    if let Some(v) = patch.work_preferences {
        b.set_nullable("work_preferences", v);
    }
    if let Some(v) = patch.motivation_factors {
        b.set("motivation_factors", v);
    }
    if let Some(v) = patch.stress_factors {
        b.set("stress_factors", v);
    }
    if let Some(v) = patch.communication_style {
        b.set_nullable("communication_style", v);
    }
    if let Some(v) = patch.learning_style {
        b.set_nullable("learning_style", v);
    }
    if let Some(v) = patch.career_goals {
        b.set("career_goals", v);
    }
    if let Some(v) = patch.strengths_weaknesses {
        b.set_nullable("strengths_weaknesses", v);
    }
    if let Some(v) = patch.completed_at {
        b.set_nullable("completed_at", v);
    }
    b
}
