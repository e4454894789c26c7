use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ExpenseClaim {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "travel")]
    pub category: String,
    #[schema(example = 120.50)]
    pub amount: f64,
    pub description: Option<String>,
    pub receipt_url: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    pub decided_by: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Per-category monthly spending cap, used by the utilization dashboard.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ExpenseBudget {
    pub id: u64,
    pub category: String,
    pub monthly_limit: f64,
}
