use crate::auth::auth::AuthUser;
use crate::checkin::gate::evaluate_point;
use crate::checkin::store::MySqlCheckInStore;
use crate::checkin::submit::{CheckInStore, CheckInSubmitter};
use crate::checkin::{CheckInError, FixedLocationProvider, GeoPoint};
use crate::events::{DomainEvent, EventBus};
use crate::model::attendance::Attendance;
use crate::model::check_in::CheckInRecord;
use crate::model::role::Capability;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CheckInRequest {
    #[schema(example = 23.7806)]
    pub latitude: f64,
    #[schema(example = 90.4193)]
    pub longitude: f64,
    /// Reported accuracy of the device fix, in meters
    #[schema(example = 8.0)]
    pub accuracy_m: Option<f64>,
    /// Where the captured photo was uploaded
    #[schema(example = "https://storage.example.com/check-ins/42.jpg")]
    pub photo_url: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CheckInFilter {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[param(value_type = String, format = "date")]
    pub from: Option<NaiveDate>,
    #[param(value_type = String, format = "date")]
    pub to: Option<NaiveDate>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct CheckInListResponse {
    pub data: Vec<CheckInRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Date(NaiveDate),
}

#[derive(Deserialize, ToSchema)]
pub struct EvaluateGeofence {
    #[schema(example = 23.7806)]
    pub latitude: f64,
    #[schema(example = 90.4193)]
    pub longitude: f64,
}

#[derive(Serialize, ToSchema)]
pub struct GeofenceEvaluation {
    #[schema(example = 42.7)]
    pub distance_m: f64,
    #[schema(example = 100.0)]
    pub radius_m: f64,
    pub in_range: bool,
}

/// Evaluate the caller's position against their assigned site's geofence.
/// Advisory only: the check-in endpoint re-evaluates with its own fix, so a
/// stale "in range" here never admits a submission.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/geofence",
    request_body = EvaluateGeofence,
    responses(
        (status = 200, description = "Gate decision for the supplied fix", body = GeofenceEvaluation),
        (status = 400, description = "Invalid coordinates or no active assignment"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn evaluate_geofence(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<EvaluateGeofence>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    if !payload.latitude.is_finite() || !payload.longitude.is_finite() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid coordinates"
        })));
    }

    let assignment = MySqlCheckInStore::new(pool.get_ref())
        .active_assignment(employee_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to load assignment");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let assignment = match assignment {
        Some(a) => a,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": CheckInError::NoActiveAssignment.to_string()
            })));
        }
    };

    let decision = evaluate_point(
        &assignment.fence,
        GeoPoint {
            latitude: payload.latitude,
            longitude: payload.longitude,
        },
    );

    Ok(HttpResponse::Ok().json(GeofenceEvaluation {
        distance_m: decision.distance_m,
        radius_m: assignment.fence.radius_m,
        in_range: decision.in_range,
    }))
}

/// Verified site check-in. The submitted coordinates are the device's fix at
/// submit time; the server recomputes the distance to the assigned site and
/// refuses anything outside the radius, whatever an earlier gate evaluation
/// said.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Check-in recorded", body = CheckInRecord),
        (status = 400, description = "Out of range, missing photo, or no active assignment", body = Object, example = json!({
            "message": "154 m from the site, outside the 100 m radius"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    bus: web::Data<EventBus>,
    payload: web::Json<CheckInRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    if payload.photo_url.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "A check-in photo is required"
        })));
    }

    if !payload.latitude.is_finite() || !payload.longitude.is_finite() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid coordinates"
        })));
    }

    let mut provider = FixedLocationProvider::new(
        GeoPoint {
            latitude: payload.latitude,
            longitude: payload.longitude,
        },
        payload.accuracy_m,
    );

    let mut submitter = CheckInSubmitter::new(MySqlCheckInStore::new(pool.get_ref()));

    match submitter
        .submit(employee_id, payload.photo_url.trim(), &mut provider)
        .await
    {
        Ok(record) => {
            bus.publish(DomainEvent::CheckInRecorded {
                record_id: record.id,
                employee_id,
                verified: record.verified,
            });
            Ok(HttpResponse::Ok().json(record))
        }
        Err(err @ CheckInError::OutOfRange { .. })
        | Err(err @ CheckInError::NoActiveAssignment)
        | Err(err @ CheckInError::LocationUnavailable)
        | Err(err @ CheckInError::LocationPermissionDenied)
        | Err(err @ CheckInError::CameraAccessDenied) => {
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": err.to_string()
            })))
        }
        Err(CheckInError::Persistence(detail)) => {
            tracing::error!(error = %detail, employee_id, "Check-in persistence failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// Close the day's attendance row. No geofence here; leaving the site is not
/// gated.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No open check-in found for today", body = Object, example = json!({
            "message": "No open check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out = CURTIME()
        WHERE employee_id = ?
        AND date = CURDATE()
        AND check_in IS NOT NULL
        AND check_out IS NULL
        "#,
    )
    .bind(employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-out failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No open check-in found for today"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully"
    })))
}

/// Check-in history for HR and admins
#[utoipa::path(
    get,
    path = "/api/v1/attendance/check-ins",
    params(CheckInFilter),
    responses(
        (status = 200, description = "Paginated check-in list", body = CheckInListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_check_ins(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CheckInFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ViewDashboards)?;

    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }
    if let Some(from) = query.from {
        where_sql.push_str(" AND created_at >= ?");
        args.push(FilterValue::Date(from));
    }
    if let Some(to) = query.to {
        where_sql.push_str(" AND created_at < ? + INTERVAL 1 DAY");
        args.push(FilterValue::Date(to));
    }

    let count_sql = format!("SELECT COUNT(*) FROM check_in_records{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count check-ins");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, assignment_id, employee_id, latitude, longitude,
               photo_url, distance_m, verified, created_at
        FROM check_in_records
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, CheckInRecord>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let records = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch check-ins");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(CheckInListResponse {
        data: records,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Daily attendance log, the payroll-facing view (HR/admin)
#[utoipa::path(
    get,
    path = "/api/v1/attendance/daily",
    params(CheckInFilter),
    responses(
        (status = 200, description = "Daily attendance rows, newest first", body = [Attendance]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_daily(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CheckInFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ViewDashboards)?;

    let per_page = query.per_page.unwrap_or(31).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }
    if let Some(from) = query.from {
        where_sql.push_str(" AND date >= ?");
        args.push(FilterValue::Date(from));
    }
    if let Some(to) = query.to {
        where_sql.push_str(" AND date <= ?");
        args.push(FilterValue::Date(to));
    }

    let sql = format!(
        r#"
        SELECT id, employee_id, date, check_in, check_out
        FROM attendance
        {}
        ORDER BY date DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut q = sqlx::query_as::<_, Attendance>(&sql);
    for arg in args {
        q = match arg {
            FilterValue::U64(v) => q.bind(v),
            FilterValue::Date(d) => q.bind(d),
        };
    }

    let rows = q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch daily attendance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(rows))
}

/// The caller's own check-in history
#[utoipa::path(
    get,
    path = "/api/v1/attendance/check-ins/my",
    responses(
        (status = 200, description = "Recent check-ins for the caller", body = [CheckInRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_check_ins(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let records = sqlx::query_as::<_, CheckInRecord>(
        r#"
        SELECT id, assignment_id, employee_id, latitude, longitude,
               photo_url, distance_m, verified, created_at
        FROM check_in_records
        WHERE employee_id = ?
        ORDER BY created_at DESC
        LIMIT 50
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch own check-ins");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(records))
}
