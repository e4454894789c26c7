use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct JobPosting {
    pub id: u64,
    #[schema(example = "Site Engineer")]
    pub title: String,
    #[schema(example = "Operations")]
    pub department: String,
    pub description: Option<String>,
    #[schema(example = "open")]
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Candidate {
    pub id: u64,
    pub posting_id: u64,
    #[schema(example = "Jane Smith")]
    pub full_name: String,
    #[schema(example = "jane@mail.com")]
    pub email: String,
    pub phone: Option<String>,
    pub resume_url: Option<String>,
    #[schema(example = "screening")]
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub applied_at: Option<DateTime<Utc>>,
}

/// Pipeline stages for the candidate board. Parsing a status string through
/// this enum is what rejects garbage stage names at the API edge.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Applied,
    Screening,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl CandidateStatus {
    pub const ALL: [CandidateStatus; 6] = [
        CandidateStatus::Applied,
        CandidateStatus::Screening,
        CandidateStatus::Interview,
        CandidateStatus::Offer,
        CandidateStatus::Hired,
        CandidateStatus::Rejected,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_strings() {
        for status in CandidateStatus::ALL {
            assert_eq!(CandidateStatus::from_str(&status.to_string()), Ok(status));
        }
    }

    #[test]
    fn unknown_status_fails_to_parse() {
        assert!(CandidateStatus::from_str("ghosted").is_err());
    }
}
