use crate::auth::auth::AuthUser;
use crate::events::{DomainEvent, EventBus};
use crate::model::notice::{Notice, NoticeAudience};
use crate::model::role::{Capability, Role};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct PublishNotice {
    #[schema(example = "Office closed Friday")]
    pub title: String,
    #[schema(example = "The head office is closed for maintenance this Friday.")]
    pub body: String,
    #[schema(example = "all")]
    pub audience: NoticeAudience,
}

/// Which audiences the caller's role can read.
fn visible_audiences(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin | Role::Hr => &["all", "employees", "hr"],
        Role::Employee => &["all", "employees"],
    }
}

/// Publish a notice (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/notices",
    request_body = PublishNotice,
    responses(
        (status = 201, description = "Notice published"),
        (status = 400, description = "Empty title or body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Notices"
)]
pub async fn publish_notice(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    bus: web::Data<EventBus>,
    payload: web::Json<PublishNotice>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::PublishNotices)?;

    if payload.title.trim().is_empty() || payload.body.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Title and body are required"
        })));
    }

    let audience = payload.audience.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO notices (title, body, audience, published_by)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(payload.title.trim())
    .bind(payload.body.trim())
    .bind(&audience)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to publish notice");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let notice_id = result.last_insert_id();

    bus.publish(DomainEvent::NoticePublished {
        notice_id,
        audience,
    });

    Ok(HttpResponse::Created().json(json!({
        "message": "Notice published",
        "id": notice_id
    })))
}

/// Notices visible to the caller, newest first
#[utoipa::path(
    get,
    path = "/api/v1/notices",
    responses(
        (status = 200, description = "Visible notices", body = [Notice]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notices"
)]
pub async fn list_notices(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let audiences = visible_audiences(auth.role);

    let placeholders = vec!["?"; audiences.len()].join(", ");
    let sql = format!(
        r#"
        SELECT id, title, body, audience, published_by, created_at
        FROM notices
        WHERE audience IN ({})
        ORDER BY created_at DESC
        LIMIT 100
        "#,
        placeholders
    );

    let mut q = sqlx::query_as::<_, Notice>(&sql);
    for audience in audiences {
        q = q.bind(*audience);
    }

    let notices = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch notices");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(notices))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employees_never_see_hr_notices() {
        assert!(!visible_audiences(Role::Employee).contains(&"hr"));
        assert!(visible_audiences(Role::Hr).contains(&"hr"));
        assert!(visible_audiences(Role::Admin).contains(&"hr"));
    }
}
