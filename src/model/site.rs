use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A physical work site with its geofence. `radius_meters` is always > 0;
/// creation and updates reject anything else.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Riverside Tower",
        "address": "12 Quay Street",
        "latitude": 23.7806,
        "longitude": 90.4193,
        "radius_meters": 100.0,
        "daily_tasks": "Perimeter walk, sign-in sheet",
        "entry_policy": "Hard hats beyond gate B",
        "is_active": true,
        "created_at": "2026-01-01T00:00:00Z"
    })
)]
pub struct Site {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub daily_tasks: Option<String>,
    pub entry_policy: Option<String>,
    pub is_active: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
