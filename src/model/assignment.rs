use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// An employee holds at most one `active` assignment at a time; creating a
/// new one completes the previous one in the same transaction.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SiteAssignment {
    pub id: u64,
    pub site_id: u64,
    pub employee_id: u64,
    #[schema(example = "active")]
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Active,
    Completed,
}
