use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Audit row for an upstream API call. `user_id` is deliberately not a
/// foreign key: usage records must outlive deleted users. No `updated_at`;
/// audit rows are effectively append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApiUsage {
    pub id: Uuid,
    pub service: String,
    pub endpoint: String,
    pub tokens_used: i32,
    pub cost: f64,
    pub user_id: Option<Uuid>,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApiUsage {
    pub service: String,
    pub endpoint: String,
    pub tokens_used: i32,
    pub cost: f64,
    pub user_id: Option<Uuid>,
    pub success: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiUsagePatch {
    pub service: Option<String>,
    pub endpoint: Option<String>,
    pub tokens_used: Option<i32>,
    pub cost: Option<f64>,
    pub user_id: Option<Option<Uuid>>,
    pub success: Option<bool>,
    pub error_message: Option<Option<String>>,
}
