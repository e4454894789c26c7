use crate::auth::auth::AuthUser;
use crate::model::assignment::SiteAssignment;
use crate::model::role::Capability;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateAssignment {
    #[schema(example = 1)]
    pub site_id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
}

/// Assign an employee to a site. Any previous active assignment for the
/// employee is completed in the same transaction, so at most one is ever
/// active.
#[utoipa::path(
    post,
    path = "/api/v1/assignments",
    request_body = CreateAssignment,
    responses(
        (status = 201, description = "Assignment created", body = Object, example = json!({
            "message": "Assignment created",
            "id": 7
        })),
        (status = 400, description = "Site missing or inactive"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
pub async fn create_assignment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAssignment>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageAssignments)?;

    let site_ok = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM sites WHERE id = ? AND is_active = TRUE)",
    )
    .bind(payload.site_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to look up site");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if !site_ok {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Site not found or inactive"
        })));
    }

    let mut tx = pool.get_ref().begin().await.map_err(|e| {
        error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // complete-then-insert keeps the at-most-one-active invariant
    sqlx::query(
        r#"
        UPDATE site_assignments
        SET status = 'completed', completed_at = NOW()
        WHERE employee_id = ? AND status = 'active'
        "#,
    )
    .bind(payload.employee_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to complete previous assignment");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO site_assignments (site_id, employee_id, status)
        VALUES (?, ?, 'active')
        "#,
    )
    .bind(payload.site_id)
    .bind(payload.employee_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to insert assignment");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit assignment");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Assignment created",
        "id": result.last_insert_id()
    })))
}

/// The caller's current active assignment
#[utoipa::path(
    get,
    path = "/api/v1/assignments/my",
    responses(
        (status = 200, description = "Active assignment", body = SiteAssignment),
        (status = 404, description = "No active assignment"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
pub async fn my_assignment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let assignment = sqlx::query_as::<_, SiteAssignment>(
        r#"
        SELECT id, site_id, employee_id, status, assigned_at, completed_at
        FROM site_assignments
        WHERE employee_id = ? AND status = 'active'
        ORDER BY assigned_at DESC
        LIMIT 1
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch assignment");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match assignment {
        Some(a) => Ok(HttpResponse::Ok().json(a)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "No active assignment"
        }))),
    }
}

/// Assignment history for one employee (HR/admin)
#[utoipa::path(
    get,
    path = "/api/v1/assignments/employee/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Assignment history", body = [SiteAssignment]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
pub async fn employee_assignments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageAssignments)?;

    let employee_id = path.into_inner();

    let assignments = sqlx::query_as::<_, SiteAssignment>(
        r#"
        SELECT id, site_id, employee_id, status, assigned_at, completed_at
        FROM site_assignments
        WHERE employee_id = ?
        ORDER BY assigned_at DESC
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch assignments");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(assignments))
}
