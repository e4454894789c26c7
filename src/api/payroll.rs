use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::role::Capability;

#[derive(Deserialize, ToSchema)]
pub struct CreatePayroll {
    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub month: NaiveDate,

    #[schema(example = 50000.0)]
    pub base_salary: f64,

    #[schema(example = 5000.0)]
    pub allowances: f64,

    #[schema(example = 2000.0)]
    pub deductions: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePayroll {
    #[schema(example = 52000.0)]
    pub base_salary: Option<f64>,

    #[schema(example = 6000.0)]
    pub allowances: Option<f64>,

    #[schema(example = 2500.0)]
    pub deductions: Option<f64>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct PayrollResponse {
    pub id: u64,
    pub employee_id: u64,

    #[schema(value_type = String, format = "date")]
    pub month: NaiveDate,

    pub base_salary: f64,
    pub allowances: f64,
    pub deductions: f64,
    pub net_salary: f64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,

    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedPayrollResponse {
    pub data: Vec<PayrollResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

fn net(base_salary: f64, allowances: f64, deductions: f64) -> f64 {
    base_salary + allowances - deductions
}

/// Create a monthly stub (Admin)
#[utoipa::path(
    post,
    path = "/api/v1/payroll",
    request_body = CreatePayroll,
    responses(
        (status = 201, description = "Payroll created"),
        (status = 409, description = "Stub already exists for that month"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn create_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManagePayroll)?;

    let net_salary = net(payload.base_salary, payload.allowances, payload.deductions);

    let result = sqlx::query(
        r#"
        INSERT INTO payroll
        (employee_id, month, base_salary, allowances, deductions, net_salary)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.month)
    .bind(payload.base_salary)
    .bind(payload.allowances)
    .bind(payload.deductions)
    .bind(net_salary)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(serde_json::json!({
            "message": "Payroll created successfully"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(serde_json::json!({
                        "message": "A stub already exists for that employee and month"
                    })));
                }
            }
            tracing::error!(error = %e, "Failed to create payroll");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// Update a stub; the net is always recomputed here, never taken from the
/// client
#[utoipa::path(
    put,
    path = "/api/v1/payroll/{payroll_id}",
    request_body = UpdatePayroll,
    params(("payroll_id", description = "Payroll ID")),
    responses(
        (status = 200, description = "Payroll updated"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManagePayroll)?;

    let payroll_id = path.into_inner();

    let current = sqlx::query_as::<_, (f64, f64, f64)>(
        r#"
        SELECT base_salary, allowances, deductions
        FROM payroll
        WHERE id = ?
        "#,
    )
    .bind(payroll_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, payroll_id, "Failed to fetch payroll");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (cur_base, cur_allowances, cur_deductions) = match current {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Payroll record not found"
            })));
        }
    };

    let base_salary = body.base_salary.unwrap_or(cur_base);
    let allowances = body.allowances.unwrap_or(cur_allowances);
    let deductions = body.deductions.unwrap_or(cur_deductions);
    let net_salary = net(base_salary, allowances, deductions);

    sqlx::query(
        r#"
        UPDATE payroll
        SET base_salary = ?, allowances = ?, deductions = ?, net_salary = ?
        WHERE id = ?
        "#,
    )
    .bind(base_salary)
    .bind(allowances)
    .bind(deductions)
    .bind(net_salary)
    .bind(payroll_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, payroll_id, "Failed to update payroll");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Payroll updated successfully"
    })))
}

/// Fetch a single stub (Admin)
#[utoipa::path(
    get,
    path = "/api/v1/payroll/{payroll_id}",
    params(("payroll_id", description = "Payroll ID")),
    responses(
        (status = 200, body = PayrollResponse),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManagePayroll)?;

    let payroll_id = path.into_inner();

    let payroll = sqlx::query_as::<_, PayrollResponse>(
        r#"
        SELECT id, employee_id, month, base_salary, allowances, deductions, net_salary
        FROM payroll
        WHERE id = ?
        "#,
    )
    .bind(payroll_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, payroll_id, "Failed to fetch payroll");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match payroll {
        Some(p) => Ok(HttpResponse::Ok().json(p)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Payroll not found"
        }))),
    }
}

/// Paginated stub listing (Admin)
#[utoipa::path(
    get,
    path = "/api/v1/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PaginatedPayrollResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManagePayroll)?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let where_clause = match query.employee_id {
        Some(_) => "WHERE employee_id = ?",
        None => "",
    };

    let count_sql = format!("SELECT COUNT(*) FROM payroll {}", where_clause);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(emp) = query.employee_id {
        count_q = count_q.bind(emp);
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count payrolls");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, employee_id, month, base_salary, allowances, deductions, net_salary
        FROM payroll
        {}
        ORDER BY month DESC
        LIMIT ? OFFSET ?
        "#,
        where_clause
    );
    let mut data_q = sqlx::query_as::<_, PayrollResponse>(&data_sql);
    if let Some(emp) = query.employee_id {
        data_q = data_q.bind(emp);
    }

    let data = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch payroll list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(PaginatedPayrollResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// The caller's own stubs
#[utoipa::path(
    get,
    path = "/api/v1/payroll/my",
    responses(
        (status = 200, description = "The caller's payroll stubs", body = [PayrollResponse]),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn my_payrolls(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let data = sqlx::query_as::<_, PayrollResponse>(
        r#"
        SELECT id, employee_id, month, base_salary, allowances, deductions, net_salary
        FROM payroll
        WHERE employee_id = ?
        ORDER BY month DESC
        LIMIT 24
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch own payroll stubs");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(data))
}

#[cfg(test)]
mod tests {
    use super::net;

    #[test]
    fn net_is_base_plus_allowances_minus_deductions() {
        assert_eq!(net(50000.0, 5000.0, 2000.0), 53000.0);
        assert_eq!(net(50000.0, 0.0, 0.0), 50000.0);
    }
}
