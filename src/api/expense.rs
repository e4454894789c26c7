use crate::auth::auth::AuthUser;
use crate::events::{DomainEvent, EventBus};
use crate::model::expense::{ExpenseBudget, ExpenseClaim};
use crate::model::role::Capability;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateClaim {
    #[schema(example = "travel")]
    pub category: String,
    #[schema(example = 120.50)]
    pub amount: f64,
    #[schema(example = "Taxi to the Riverside site")]
    pub description: Option<String>,
    pub receipt_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SetBudget {
    #[schema(example = "travel")]
    pub category: String,
    #[schema(example = 5000.0)]
    pub monthly_limit: f64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ClaimFilter {
    pub employee_id: Option<u64>,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct ClaimListResponse {
    pub data: Vec<ExpenseClaim>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// One row of the budget dashboard: spend so far this month against the cap.
#[derive(Serialize, ToSchema)]
pub struct BudgetUtilization {
    #[schema(example = "travel")]
    pub category: String,
    #[schema(example = 5000.0)]
    pub monthly_limit: f64,
    #[schema(example = 1230.5)]
    pub approved_total: f64,
    #[schema(example = 24.6)]
    pub utilization_pct: f64,
}

pub(crate) fn utilization_pct(approved_total: f64, monthly_limit: f64) -> f64 {
    if monthly_limit <= 0.0 {
        return 0.0;
    }
    approved_total / monthly_limit * 100.0
}

/// Submit an expense claim
#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    request_body = CreateClaim,
    responses(
        (status = 200, description = "Claim submitted", body = Object, example = json!({
            "message": "Expense claim submitted",
            "status": "pending"
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn create_claim(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateClaim>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    if payload.category.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Category is required"
        })));
    }
    if !payload.amount.is_finite() || payload.amount <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Amount must be greater than zero"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO expense_claims
            (employee_id, category, amount, description, receipt_url)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.category.trim().to_lowercase())
    .bind(payload.amount)
    .bind(&payload.description)
    .bind(&payload.receipt_url)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to create expense claim");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Expense claim submitted",
        "status": "pending"
    })))
}

async fn decide_claim(
    auth: &AuthUser,
    pool: &MySqlPool,
    bus: &EventBus,
    claim_id: u64,
    status: &str,
) -> actix_web::Result<HttpResponse> {
    auth.require(Capability::DecideExpense)?;

    let result = sqlx::query(
        r#"
        UPDATE expense_claims
        SET status = ?, decided_by = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(status)
    .bind(auth.user_id)
    .bind(claim_id)
    .execute(pool)
    .await
    .map_err(|e| {
        error!(error = %e, claim_id, "Expense decision failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Claim not found or already processed"
        })));
    }

    let employee_id =
        sqlx::query_scalar::<_, u64>("SELECT employee_id FROM expense_claims WHERE id = ?")
            .bind(claim_id)
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    bus.publish(DomainEvent::ExpenseDecided {
        claim_id,
        employee_id,
        status: status.to_string(),
    });

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Claim {}", status)
    })))
}

/// Approve a claim (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/expenses/{claim_id}/approve",
    params(("claim_id" = u64, Path, description = "Claim ID")),
    responses(
        (status = 200, description = "Claim approved"),
        (status = 400, description = "Claim not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn approve_claim(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    bus: web::Data<EventBus>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    decide_claim(&auth, pool.get_ref(), bus.get_ref(), path.into_inner(), "approved").await
}

/// Reject a claim (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/expenses/{claim_id}/reject",
    params(("claim_id" = u64, Path, description = "Claim ID")),
    responses(
        (status = 200, description = "Claim rejected"),
        (status = 400, description = "Claim not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn reject_claim(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    bus: web::Data<EventBus>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    decide_claim(&auth, pool.get_ref(), bus.get_ref(), path.into_inner(), "rejected").await
}

/// Paginated claim listing; employees see their own, HR/Admin see all
#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    params(ClaimFilter),
    responses(
        (status = 200, description = "Paginated claim list", body = ClaimListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn list_claims(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ClaimFilter>,
) -> actix_web::Result<impl Responder> {
    // employees are pinned to their own claims whatever the filter says
    let employee_filter = if auth.is_employee() {
        Some(auth.require_employee()?)
    } else {
        query.employee_id
    };

    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    if employee_filter.is_some() {
        where_sql.push_str(" AND employee_id = ?");
    }
    if query.status.is_some() {
        where_sql.push_str(" AND status = ?");
    }

    let count_sql = format!("SELECT COUNT(*) FROM expense_claims{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(emp) = employee_filter {
        count_q = count_q.bind(emp);
    }
    if let Some(status) = &query.status {
        count_q = count_q.bind(status);
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count expense claims");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, employee_id, category, amount, description, receipt_url,
               status, decided_by, created_at
        FROM expense_claims
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );
    let mut data_q = sqlx::query_as::<_, ExpenseClaim>(&data_sql);
    if let Some(emp) = employee_filter {
        data_q = data_q.bind(emp);
    }
    if let Some(status) = &query.status {
        data_q = data_q.bind(status);
    }

    let claims = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch expense claims");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(ClaimListResponse {
        data: claims,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Create or replace a category budget (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/expenses/budgets",
    request_body = SetBudget,
    responses(
        (status = 200, description = "Budget saved"),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn set_budget(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SetBudget>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::DecideExpense)?;

    if !payload.monthly_limit.is_finite() || payload.monthly_limit <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "monthly_limit must be greater than zero"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO expense_budgets (category, monthly_limit)
        VALUES (?, ?)
        ON DUPLICATE KEY UPDATE monthly_limit = VALUES(monthly_limit)
        "#,
    )
    .bind(payload.category.trim().to_lowercase())
    .bind(payload.monthly_limit)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to save budget");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Budget saved"
    })))
}

/// Budget utilization for the current month (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/expenses/budgets/utilization",
    responses(
        (status = 200, description = "Per-category utilization", body = [BudgetUtilization]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn budget_utilization(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ViewDashboards)?;

    let budgets = sqlx::query_as::<_, ExpenseBudget>(
        "SELECT id, category, monthly_limit FROM expense_budgets ORDER BY category",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch budgets");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let mut rows = Vec::with_capacity(budgets.len());
    for budget in budgets {
        let approved_total = sqlx::query_scalar::<_, Option<f64>>(
            r#"
            SELECT SUM(amount)
            FROM expense_claims
            WHERE category = ?
              AND status = 'approved'
              AND created_at >= DATE_FORMAT(CURDATE(), '%Y-%m-01')
            "#,
        )
        .bind(&budget.category)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, category = %budget.category, "Failed to sum claims");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .unwrap_or(0.0);

        rows.push(BudgetUtilization {
            utilization_pct: utilization_pct(approved_total, budget.monthly_limit),
            category: budget.category,
            monthly_limit: budget.monthly_limit,
            approved_total,
        });
    }

    Ok(HttpResponse::Ok().json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilization_is_a_percentage_of_the_cap() {
        assert_eq!(utilization_pct(1250.0, 5000.0), 25.0);
        assert_eq!(utilization_pct(0.0, 5000.0), 0.0);
    }

    #[test]
    fn overspend_reads_above_one_hundred() {
        assert!(utilization_pct(6000.0, 5000.0) > 100.0);
    }

    #[test]
    fn a_zero_cap_never_divides() {
        assert_eq!(utilization_pct(100.0, 0.0), 0.0);
    }
}
