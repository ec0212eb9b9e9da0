use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use crate::config::Config;
use crate::db::create_pool;
use crate::errors::{StoreError, StoreResult};
use crate::repos::{
    ApiUsageRepo, EducationRepo, ExperienceRepo, JobMatchRepo, ProfileRepo, ProjectRepo,
    ResumeRepo, SkillRepo, UserRepo,
};

/// Entry point to the data layer: one shared pool, one accessor per entity.
#[derive(Clone)]
pub struct Client {
    pool: PgPool,
}

impl Client {
    /// Connects a new pool according to `config`.
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let pool = create_pool(config).await?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool (tests, callers managing their own pool).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(sqlx::Error::Migrate(Box::new(e))))?;
        info!("Schema migrations applied");
        Ok(())
    }

    /// Connectivity probe.
    pub async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Starts a database transaction for caller-composed all-or-nothing
    /// batches. Commit/rollback is the caller's responsibility.
    pub async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// The underlying pool, for queries this layer does not cover.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn users(&self) -> UserRepo {
        UserRepo::new(self.pool.clone())
    }

    pub fn skills(&self) -> SkillRepo {
        SkillRepo::new(self.pool.clone())
    }

    pub fn experiences(&self) -> ExperienceRepo {
        ExperienceRepo::new(self.pool.clone())
    }

    pub fn educations(&self) -> EducationRepo {
        EducationRepo::new(self.pool.clone())
    }

    pub fn projects(&self) -> ProjectRepo {
        ProjectRepo::new(self.pool.clone())
    }

    pub fn resumes(&self) -> ResumeRepo {
        ResumeRepo::new(self.pool.clone())
    }

    pub fn profiles(&self) -> ProfileRepo {
        ProfileRepo::new(self.pool.clone())
    }

    pub fn job_matches(&self) -> JobMatchRepo {
        JobMatchRepo::new(self.pool.clone())
    }

    pub fn api_usage(&self) -> ApiUsageRepo {
        ApiUsageRepo::new(self.pool.clone())
    }
}
