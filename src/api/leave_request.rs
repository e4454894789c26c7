use crate::auth::auth::AuthUser;
use crate::events::{DomainEvent, EventBus};
use crate::model::role::Capability;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlPool, prelude::FromRow};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, Copy, Clone, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Casual,
    Unpaid,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    #[schema(example = "Flu, doctor's note attached")]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct DecideLeave {
    /// Required when rejecting
    #[schema(example = "Team is at minimum staffing that week")]
    pub note: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Filter by leave status
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: String,
    pub reason: Option<String>,
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// User id of the approver/rejecter, once decided
    pub decided_by: Option<u64>,
    pub decision_note: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted",
            "status": "pending"
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    if payload.start_date > payload.end_date {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "start_date cannot be after end_date"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, start_date, end_date, leave_type, reason)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.leave_type.to_string())
    .bind(&payload.reason)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request submitted",
        "status": "pending"
    })))
}

async fn decide_leave(
    auth: &AuthUser,
    pool: &MySqlPool,
    bus: &EventBus,
    leave_id: u64,
    status: &str,
    note: Option<&str>,
) -> actix_web::Result<HttpResponse> {
    auth.require(Capability::DecideLeave)?;

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, decided_by = ?, decision_note = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(status)
    .bind(auth.user_id)
    .bind(note)
    .bind(leave_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Leave decision failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave request not found or already processed"
        })));
    }

    let employee_id =
        sqlx::query_scalar::<_, u64>("SELECT employee_id FROM leave_requests WHERE id = ?")
            .bind(leave_id)
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    bus.publish(DomainEvent::LeaveDecided {
        leave_id,
        employee_id,
        status: status.to_string(),
    });

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Leave {}", status)
    })))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body = DecideLeave,
    responses(
        (status = 200, description = "Leave approved"),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    bus: web::Data<EventBus>,
    path: web::Path<u64>,
    body: web::Json<DecideLeave>,
) -> actix_web::Result<impl Responder> {
    decide_leave(
        &auth,
        pool.get_ref(),
        bus.get_ref(),
        path.into_inner(),
        "approved",
        body.note.as_deref(),
    )
    .await
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = DecideLeave,
    responses(
        (status = 200, description = "Leave rejected"),
        (status = 400, description = "Missing note, not found, or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    bus: web::Data<EventBus>,
    path: web::Path<u64>,
    body: web::Json<DecideLeave>,
) -> actix_web::Result<impl Responder> {
    // a rejection without a reason reads as arbitrary; require the note
    let note = match body.note.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => n,
        _ => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "A note is required when rejecting"
            })));
        }
    };

    decide_leave(
        &auth,
        pool.get_ref(),
        bus.get_ref(),
        path.into_inner(),
        "rejected",
        Some(note),
    )
    .await
}

/// Fetch one leave application
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveResponse>(
        r#"
        SELECT id, employee_id, start_date, end_date, leave_type, reason,
               status, decided_by, decision_note, created_at
        FROM leave_requests
        WHERE id = ?
        "#,
    )
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match leave {
        Some(data) => {
            // an employee may read their own request only
            if auth.employee_id != Some(data.employee_id) {
                auth.require(Capability::DecideLeave)?;
            }
            Ok(HttpResponse::Ok().json(data))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Leave request not found"
        }))),
    }
}

/// Paginated leave listing (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::DecideLeave)?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error=%e, "Failed to count leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT id, employee_id, start_date, end_date, leave_type, reason,
               status, decided_by, decision_note, created_at
        FROM leave_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveResponse>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error=%e, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let response = LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// The caller's own leave requests
#[utoipa::path(
    get,
    path = "/api/v1/leave/my",
    responses(
        (status = 200, description = "The caller's leave requests", body = [LeaveResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let leaves = sqlx::query_as::<_, LeaveResponse>(
        r#"
        SELECT id, employee_id, start_date, end_date, leave_type, reason,
               status, decided_by, decision_note, created_at
        FROM leave_requests
        WHERE employee_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch own leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(leaves))
}
