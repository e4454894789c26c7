use crate::auth::auth::AuthUser;
use crate::events::{DomainEvent, EventBus};
use crate::model::chat::ChatMessage;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Deserialize, ToSchema)]
pub struct SendMessage {
    #[schema(example = 2)]
    pub to_user_id: u64,
    #[schema(example = "On my way to the site")]
    pub body: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ConversationQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct ConversationResponse {
    pub data: Vec<ChatMessage>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

fn validate_message(from_user_id: u64, to_user_id: u64, body: &str) -> Result<(), &'static str> {
    if body.is_empty() {
        return Err("Message body must not be empty");
    }
    if body.len() > MAX_MESSAGE_LEN {
        return Err("Message body is too long");
    }
    if from_user_id == to_user_id {
        return Err("Cannot message yourself");
    }
    Ok(())
}

/// Send a direct message
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    request_body = SendMessage,
    responses(
        (status = 201, description = "Message sent", body = Object, example = json!({
            "message": "Message sent",
            "id": 12
        })),
        (status = 400, description = "Empty body, self-message, or unknown recipient"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn send_message(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    bus: web::Data<EventBus>,
    payload: web::Json<SendMessage>,
) -> actix_web::Result<impl Responder> {
    let body = payload.body.trim();

    if let Err(reason) = validate_message(auth.user_id, payload.to_user_id, body) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": reason })));
    }

    let recipient_ok = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ? AND is_active = TRUE)",
    )
    .bind(payload.to_user_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to look up recipient");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if !recipient_ok {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Recipient not found"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO chat_messages (from_user_id, to_user_id, body)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.to_user_id)
    .bind(body)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to store chat message");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let message_id = result.last_insert_id();

    bus.publish(DomainEvent::ChatMessageSent {
        message_id,
        from_user_id: auth.user_id,
        to_user_id: payload.to_user_id,
    });

    Ok(HttpResponse::Created().json(json!({
        "message": "Message sent",
        "id": message_id
    })))
}

/// The caller's conversation with one peer, newest first
#[utoipa::path(
    get,
    path = "/api/v1/chat/{peer_id}",
    params(
        ("peer_id" = u64, Path, description = "User ID of the other participant"),
        ConversationQuery
    ),
    responses(
        (status = 200, description = "Paginated conversation", body = ConversationResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn conversation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<ConversationQuery>,
) -> actix_web::Result<impl Responder> {
    let peer_id = path.into_inner();
    let per_page = query.per_page.unwrap_or(50).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM chat_messages
        WHERE (from_user_id = ? AND to_user_id = ?)
           OR (from_user_id = ? AND to_user_id = ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(peer_id)
    .bind(peer_id)
    .bind(auth.user_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to count chat messages");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let messages = sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT id, from_user_id, to_user_id, body, created_at
        FROM chat_messages
        WHERE (from_user_id = ? AND to_user_id = ?)
           OR (from_user_id = ? AND to_user_id = ?)
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(auth.user_id)
    .bind(peer_id)
    .bind(peer_id)
    .bind(auth.user_id)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch conversation");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(ConversationResponse {
        data: messages,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_oversized_bodies_are_rejected() {
        assert!(validate_message(1, 2, "").is_err());
        assert!(validate_message(1, 2, &"x".repeat(MAX_MESSAGE_LEN + 1)).is_err());
        assert!(validate_message(1, 2, "hello").is_ok());
    }

    #[test]
    fn messaging_yourself_is_rejected() {
        assert!(validate_message(5, 5, "note to self").is_err());
    }
}
