use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A rendered resume document. `content` holds the full section tree as
/// JSONB; the layer does not interpret it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub title: String,
    pub template: String,
    pub content: Value,
    pub pdf_url: Option<String>,
    pub is_public: bool,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResume {
    pub user_id: Uuid,
    pub title: String,
    pub template: String,
    pub content: Value,
    pub pdf_url: Option<String>,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumePatch {
    pub title: Option<String>,
    pub template: Option<String>,
    pub content: Option<Value>,
    pub pdf_url: Option<Option<String>>,
    pub is_public: Option<bool>,
}
