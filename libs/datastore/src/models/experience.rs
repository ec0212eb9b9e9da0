use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Experience {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    /// True while this is the person's current position (`end_date` open).
    pub current: bool,
    pub description: Option<String>,
    pub achievements: Vec<String>,
    pub skills: Vec<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExperience {
    pub user_id: Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub current: bool,
    pub description: Option<String>,
    pub achievements: Vec<String>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperiencePatch {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub current: Option<bool>,
    pub description: Option<Option<String>>,
    pub achievements: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
}
