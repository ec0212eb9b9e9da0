use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A skill owned by a user. Unique per `(user_id, name)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub level: i32,
    pub verified: bool,
    pub years_of_exp: Option<f64>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSkill {
    pub user_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub level: i32,
    pub verified: bool,
    pub years_of_exp: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub category: Option<Option<String>>,
    pub level: Option<i32>,
    pub verified: Option<bool>,
    pub years_of_exp: Option<Option<f64>>,
}
