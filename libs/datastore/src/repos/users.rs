use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};
use crate::models::{NewUser, User, UserPatch};
use crate::query::{AggregateResult, AggregateSpec, Filter, GroupByRow, ListQuery, Scalar};

use super::exec;
use super::patch::PatchBuilder;

const TABLE: &str = "users";
const COLUMNS: &[&str] = &[
    "id",
    "email",
    "name",
    "avatar",
    "phone",
    "location",
    "website",
    "linkedin",
    "github",
    "summary",
    "created_at",
    "updated_at",
];

const INSERT: &str = r#"
    INSERT INTO users (id, email, name, avatar, phone, location, website, linkedin, github, summary)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
"#;

/// Repository for `users`, the root entity. Email is unique; upserts key on it.
#[derive(Clone)]
pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_unique(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn find_many(&self, query: &ListQuery) -> StoreResult<Vec<User>> {
        exec::fetch_many(&self.pool, TABLE, COLUMNS, query).await
    }

    pub async fn create(&self, data: NewUser) -> StoreResult<User> {
        debug!(email = %data.email, "creating user");
        Ok(
            sqlx::query_as::<_, User>(&format!("{INSERT} RETURNING *"))
                .bind(Uuid::new_v4())
                .bind(&data.email)
                .bind(&data.name)
                .bind(&data.avatar)
                .bind(&data.phone)
                .bind(&data.location)
                .bind(&data.website)
                .bind(&data.linkedin)
                .bind(&data.github)
                .bind(&data.summary)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    pub async fn update(&self, id: Uuid, patch: UserPatch) -> StoreResult<User> {
        let builder = build_patch(patch);
        if builder.is_empty() {
            return Err(StoreError::Validation("empty patch for User".to_string()));
        }
        let (sets, mut binds) = builder.render(1);
        binds.push(Scalar::Uuid(id));
        let sql = format!(
            "UPDATE users SET {sets}, updated_at = NOW() WHERE id = ${} RETURNING *",
            binds.len()
        );
        exec::fetch_optional_as::<User>(&self.pool, &sql, binds)
            .await?
            .ok_or(StoreError::NotFound { entity: "User" })
    }

    /// Creates the user, or applies `update` to the existing row with the
    /// same email.
    pub async fn upsert(&self, data: NewUser, update: UserPatch) -> StoreResult<User> {
        let builder = build_patch(update);
        let (sets, extra) = if builder.is_empty() {
            ("updated_at = NOW()".to_string(), Vec::new())
        } else {
            let (sets, binds) = builder.render(11);
            (format!("{sets}, updated_at = NOW()"), binds)
        };
        let sql = format!("{INSERT} ON CONFLICT (email) DO UPDATE SET {sets} RETURNING *");
        let query = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&data.email)
            .bind(&data.name)
            .bind(&data.avatar)
            .bind(&data.phone)
            .bind(&data.location)
            .bind(&data.website)
            .bind(&data.linkedin)
            .bind(&data.github)
            .bind(&data.summary);
        let row = exec::bind_scalars(query, extra).fetch_one(&self.pool).await?;
        User::from_row(&row).map_err(StoreError::Backend)
    }

    /// Deletes the user and returns the removed record. Child rows cascade.
    pub async fn delete(&self, id: Uuid) -> StoreResult<User> {
        sqlx::query_as::<_, User>("DELETE FROM users WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "User" })
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

fn build_patch(patch: UserPatch) -> PatchBuilder {
    let mut b = PatchBuilder::new();
    if let Some(v) = patch.email {
        b.set("email", v);
    }
    if let Some(v) = patch.name {
        b.set_nullable("name", v);
    }
    if let Some(v) = patch.avatar {
        b.set_nullable("avatar", v);
    }
    if let Some(v) = patch.phone {
        b.set_nullable("phone", v);
    }
    if let Some(v) = patch.location {
        b.set_nullable("location", v);
    }
    if let Some(v) = patch.website {
        b.set_nullable("website", v);
    }
    if let Some(v) = patch.linkedin {
        b.set_nullable("linkedin", v);
    }
    if let Some(v) = patch.github {
        b.set_nullable("github", v);
    }
    if let Some(v) = patch.summary {
        b.set_nullable("summary", v);
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_user_patch_builds_nothing() {
        assert!(build_patch(UserPatch::default()).is_empty());
    }

    #[test]
    fn test_patch_distinguishes_untouched_from_null() {
        let patch = UserPatch {
            name: Some(None),
            summary: Some(Some("ten years of systems work".to_string())),
            ..Default::default()
        };
        let (sets, binds) = build_patch(patch).render(1);
        assert_eq!(sets, "name = NULL, summary = $1");
        assert_eq!(binds.len(), 1);
    }
}
