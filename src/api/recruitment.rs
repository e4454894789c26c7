use crate::auth::auth::AuthUser;
use crate::events::{DomainEvent, EventBus};
use crate::model::recruitment::{Candidate, CandidateStatus, JobPosting};
use crate::model::role::Capability;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreatePosting {
    #[schema(example = "Site Engineer")]
    pub title: String,
    #[schema(example = "Operations")]
    pub department: String,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ApplyCandidate {
    #[schema(example = "Jane Smith")]
    pub full_name: String,
    #[schema(example = "jane@mail.com", format = "email")]
    pub email: String,
    pub phone: Option<String>,
    pub resume_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct MoveCandidate {
    #[schema(example = "interview")]
    pub status: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BoardQuery {
    /// Limit the board to one posting
    pub posting_id: Option<u64>,
}

/// One column of the candidate board
#[derive(Serialize, ToSchema)]
pub struct BoardColumn {
    #[schema(example = "screening")]
    pub status: String,
    pub candidates: Vec<Candidate>,
}

/// Open a job posting (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/recruitment/postings",
    request_body = CreatePosting,
    responses(
        (status = 201, description = "Posting created"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn create_posting(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePosting>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageRecruitment)?;

    let result = sqlx::query(
        r#"
        INSERT INTO job_postings (title, department, description)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(payload.title.trim())
    .bind(payload.department.trim())
    .bind(&payload.description)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create posting");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Posting created",
        "id": result.last_insert_id()
    })))
}

/// List postings; anyone signed in can browse open roles
#[utoipa::path(
    get,
    path = "/api/v1/recruitment/postings",
    responses(
        (status = 200, description = "All postings", body = [JobPosting]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn list_postings(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let postings = sqlx::query_as::<_, JobPosting>(
        r#"
        SELECT id, title, department, description, status, created_at
        FROM job_postings
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch postings");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(postings))
}

/// Close a posting (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/recruitment/postings/{posting_id}/close",
    params(("posting_id" = u64, Path, description = "Posting ID")),
    responses(
        (status = 200, description = "Posting closed"),
        (status = 404, description = "Posting not found or already closed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn close_posting(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageRecruitment)?;

    let posting_id = path.into_inner();

    let result =
        sqlx::query("UPDATE job_postings SET status = 'closed' WHERE id = ? AND status = 'open'")
            .bind(posting_id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, posting_id, "Failed to close posting");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Posting not found or already closed"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Posting closed" })))
}

/// Register a candidate against an open posting (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/recruitment/postings/{posting_id}/candidates",
    params(("posting_id" = u64, Path, description = "Posting ID")),
    request_body = ApplyCandidate,
    responses(
        (status = 201, description = "Candidate added"),
        (status = 400, description = "Posting missing or closed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn add_candidate(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ApplyCandidate>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageRecruitment)?;

    let posting_id = path.into_inner();

    let open = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM job_postings WHERE id = ? AND status = 'open')",
    )
    .bind(posting_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, posting_id, "Failed to look up posting");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if !open {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Posting not found or closed"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO candidates (posting_id, full_name, email, phone, resume_url)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(posting_id)
    .bind(payload.full_name.trim())
    .bind(payload.email.trim())
    .bind(&payload.phone)
    .bind(&payload.resume_url)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, posting_id, "Failed to add candidate");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Candidate added",
        "id": result.last_insert_id()
    })))
}

/// Move a candidate to another pipeline stage (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/recruitment/candidates/{candidate_id}/status",
    params(("candidate_id" = u64, Path, description = "Candidate ID")),
    request_body = MoveCandidate,
    responses(
        (status = 200, description = "Candidate moved"),
        (status = 400, description = "Unknown pipeline stage"),
        (status = 404, description = "Candidate not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn move_candidate(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    bus: web::Data<EventBus>,
    path: web::Path<u64>,
    payload: web::Json<MoveCandidate>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageRecruitment)?;

    let candidate_id = path.into_inner();

    let status = match CandidateStatus::from_str(payload.status.trim()) {
        Ok(s) => s,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Unknown pipeline stage: {}", payload.status)
            })));
        }
    };

    let result = sqlx::query("UPDATE candidates SET status = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(candidate_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, candidate_id, "Failed to move candidate");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Candidate not found"
        })));
    }

    bus.publish(DomainEvent::CandidateMoved {
        candidate_id,
        status: status.to_string(),
    });

    Ok(HttpResponse::Ok().json(json!({ "message": "Candidate moved" })))
}

/// Candidates grouped by pipeline stage, one column per stage (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/recruitment/board",
    params(BoardQuery),
    responses(
        (status = 200, description = "Board columns in pipeline order", body = [BoardColumn]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn candidate_board(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<BoardQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageRecruitment)?;

    let where_clause = match query.posting_id {
        Some(_) => "WHERE posting_id = ?",
        None => "",
    };

    let sql = format!(
        r#"
        SELECT id, posting_id, full_name, email, phone, resume_url, status, applied_at
        FROM candidates
        {}
        ORDER BY applied_at DESC
        "#,
        where_clause
    );

    let mut q = sqlx::query_as::<_, Candidate>(&sql);
    if let Some(posting_id) = query.posting_id {
        q = q.bind(posting_id);
    }

    let candidates = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch candidates");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let board: Vec<BoardColumn> = CandidateStatus::ALL
        .iter()
        .map(|stage| {
            let key = stage.to_string();
            BoardColumn {
                candidates: candidates
                    .iter()
                    .filter(|c| c.status == key)
                    .cloned()
                    .collect(),
                status: key,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(board))
}
