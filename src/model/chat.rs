use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ChatMessage {
    pub id: u64,
    pub from_user_id: u64,
    pub to_user_id: u64,
    #[schema(example = "On my way to the site")]
    pub body: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
