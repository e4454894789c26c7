use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Notice {
    pub id: u64,
    #[schema(example = "Office closed Friday")]
    pub title: String,
    pub body: String,
    #[schema(example = "all")]
    pub audience: String,
    pub published_by: u64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoticeAudience {
    All,
    Employees,
    Hr,
}
