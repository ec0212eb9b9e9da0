use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Psychological assessment results for a user. Score payloads
/// (`big_five_scores`, `work_preferences`, `strengths_weaknesses`) are
/// opaque JSONB produced by the assessment pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PsychologicalProfile {
    pub id: Uuid,
    pub personality_type: Option<String>,
    pub big_five_scores: Option<Value>,
    pub work_preferences: Option<Value>,
    pub motivation_factors: Vec<String>,
    pub stress_factors: Vec<String>,
    pub communication_style: Option<String>,
    pub learning_style: Option<String>,
    pub career_goals: Vec<String>,
    pub strengths_weaknesses: Option<Value>,
    pub completed_at: Option<DateTime<Utc>>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPsychologicalProfile {
    pub user_id: Uuid,
    pub personality_type: Option<String>,
    pub big_five_scores: Option<Value>,
    pub work_preferences: Option<Value>,
    pub motivation_factors: Vec<String>,
    pub stress_factors: Vec<String>,
    pub communication_style: Option<String>,
    pub learning_style: Option<String>,
    pub career_goals: Vec<String>,
    pub strengths_weaknesses: Option<Value>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PsychologicalProfilePatch {
    pub personality_type: Option<Option<String>>,
    pub big_five_scores: Option<Option<Value>>,
    pub work_preferences: Option<Option<Value>>,
    pub motivation_factors: Option<Vec<String>>,
    pub stress_factors: Option<Vec<String>>,
    pub communication_style: Option<Option<String>>,
    pub learning_style: Option<Option<String>>,
    pub career_goals: Option<Vec<String>>,
    pub strengths_weaknesses: Option<Option<Value>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}
