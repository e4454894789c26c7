use crate::api::expense::{BudgetUtilization, utilization_pct};
use crate::auth::auth::AuthUser;
use crate::model::recruitment::CandidateStatus;
use crate::model::role::Capability;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct StatusCount {
    #[schema(example = "screening")]
    pub status: String,
    #[schema(example = 4)]
    pub count: i64,
}

/// Everything the admin landing page renders in one round trip.
#[derive(Serialize, ToSchema)]
pub struct DashboardSummary {
    #[schema(example = 42)]
    pub headcount: i64,
    #[schema(example = 31)]
    pub todays_check_ins: i64,
    #[schema(example = 3)]
    pub pending_leave: i64,
    #[schema(example = 5)]
    pub pending_expenses: i64,
    #[schema(example = 2)]
    pub open_positions: i64,
    pub candidates_by_status: Vec<StatusCount>,
    pub budget_utilization: Vec<BudgetUtilization>,
}

/// Every pipeline stage appears on the board, zero-filled when no candidate
/// sits in it.
fn fill_status_counts(rows: Vec<(String, i64)>) -> Vec<StatusCount> {
    CandidateStatus::ALL
        .iter()
        .map(|status| {
            let name = status.to_string();
            let count = rows
                .iter()
                .find(|(s, _)| *s == name)
                .map(|(_, n)| *n)
                .unwrap_or(0);
            StatusCount {
                status: name,
                count,
            }
        })
        .collect()
}

async fn count(pool: &MySqlPool, sql: &str) -> Result<i64, actix_web::Error> {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            error!(error = %e, sql, "Dashboard count query failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })
}

/// Summary figures for the admin/HR dashboard
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/summary",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ViewDashboards)?;

    let pool = pool.get_ref();

    let headcount = count(pool, "SELECT COUNT(*) FROM employees WHERE status = 'active'").await?;
    let todays_check_ins = count(
        pool,
        "SELECT COUNT(*) FROM check_in_records WHERE created_at >= CURDATE()",
    )
    .await?;
    let pending_leave = count(
        pool,
        "SELECT COUNT(*) FROM leave_requests WHERE status = 'pending'",
    )
    .await?;
    let pending_expenses = count(
        pool,
        "SELECT COUNT(*) FROM expense_claims WHERE status = 'pending'",
    )
    .await?;
    let open_positions = count(
        pool,
        "SELECT COUNT(*) FROM job_postings WHERE status = 'open'",
    )
    .await?;

    let candidate_rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM candidates GROUP BY status",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to count candidates");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let budget_rows = sqlx::query_as::<_, (String, f64, f64)>(
        r#"
        SELECT b.category, b.monthly_limit,
               COALESCE(SUM(CASE
                   WHEN c.status = 'approved'
                    AND c.created_at >= DATE_FORMAT(CURDATE(), '%Y-%m-01')
                   THEN c.amount
               END), 0)
        FROM expense_budgets b
        LEFT JOIN expense_claims c ON c.category = b.category
        GROUP BY b.id, b.category, b.monthly_limit
        ORDER BY b.category
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to compute budget utilization");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let budget_utilization = budget_rows
        .into_iter()
        .map(|(category, monthly_limit, approved_total)| BudgetUtilization {
            utilization_pct: utilization_pct(approved_total, monthly_limit),
            category,
            monthly_limit,
            approved_total,
        })
        .collect();

    Ok(HttpResponse::Ok().json(DashboardSummary {
        headcount,
        todays_check_ins,
        pending_leave,
        pending_expenses,
        open_positions,
        candidates_by_status: fill_status_counts(candidate_rows),
        budget_utilization,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pipeline_still_shows_every_stage() {
        let counts = fill_status_counts(Vec::new());
        assert_eq!(counts.len(), CandidateStatus::ALL.len());
        assert!(counts.iter().all(|c| c.count == 0));
    }

    #[test]
    fn counted_stages_keep_their_totals() {
        let counts = fill_status_counts(vec![
            ("screening".into(), 4),
            ("hired".into(), 1),
        ]);
        let screening = counts.iter().find(|c| c.status == "screening").unwrap();
        assert_eq!(screening.count, 4);
        let offer = counts.iter().find(|c| c.status == "offer").unwrap();
        assert_eq!(offer.count, 0);
    }
}
