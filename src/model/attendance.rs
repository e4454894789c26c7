use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Daily attendance log row. The verified evidence for the check-in lives in
/// `check_in_records`; this row is what payroll reads.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, nullable = true)]
    pub check_in: Option<NaiveTime>,
    #[schema(value_type = String, nullable = true)]
    pub check_out: Option<NaiveTime>,
}
