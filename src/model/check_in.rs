use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row per check-in attempt that passed verification. Insert-only; the
/// application never updates or deletes these.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 42,
        "assignment_id": 7,
        "employee_id": 1000,
        "latitude": 23.7806,
        "longitude": 90.4193,
        "photo_url": "https://storage.example.com/check-ins/42.jpg",
        "distance_m": 12.4,
        "verified": true,
        "created_at": "2026-01-01T09:02:11Z"
    })
)]
pub struct CheckInRecord {
    pub id: u64,
    pub assignment_id: u64,
    pub employee_id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub photo_url: String,
    pub distance_m: f64,
    pub verified: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
