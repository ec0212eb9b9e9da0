use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A scored job posting for a user. `match_score` and `ai_analysis` are
/// produced upstream; this layer only stores them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobMatch {
    pub id: Uuid,
    pub job_title: String,
    pub company: String,
    pub job_description: String,
    pub requirements: Vec<String>,
    pub location: Option<String>,
    pub salary_range: Option<String>,
    pub job_url: Option<String>,
    pub match_score: f64,
    pub match_reasons: Vec<String>,
    pub missing_skills: Vec<String>,
    pub ai_analysis: Option<Value>,
    pub applied: bool,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJobMatch {
    pub user_id: Uuid,
    pub job_title: String,
    pub company: String,
    pub job_description: String,
    pub requirements: Vec<String>,
    pub location: Option<String>,
    pub salary_range: Option<String>,
    pub job_url: Option<String>,
    pub match_score: f64,
    pub match_reasons: Vec<String>,
    pub missing_skills: Vec<String>,
    pub ai_analysis: Option<Value>,
    pub applied: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobMatchPatch {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub job_description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub location: Option<Option<String>>,
    pub salary_range: Option<Option<String>>,
    pub job_url: Option<Option<String>>,
    pub match_score: Option<f64>,
    pub match_reasons: Option<Vec<String>>,
    pub missing_skills: Option<Vec<String>>,
    pub ai_analysis: Option<Option<Value>>,
    pub applied: Option<bool>,
}
