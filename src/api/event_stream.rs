use crate::auth::auth::AuthUser;
use crate::events::{DomainEvent, EventBus};
use actix_web::{HttpResponse, Responder, web};
use futures_util::stream;

/// One SSE frame per event; `None` when the event cannot be serialized, in
/// which case the stream skips it rather than terminating.
fn sse_frame(event: &DomainEvent) -> Option<web::Bytes> {
    match serde_json::to_string(event) {
        Ok(json) => Some(web::Bytes::from(format!("data: {json}\n\n"))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize domain event");
            None
        }
    }
}

/// Live change feed as server-sent events. The subscription is dropped when
/// the client disconnects, which is the unsubscribe.
#[utoipa::path(
    get,
    path = "/api/v1/events/stream",
    responses(
        (status = 200, description = "text/event-stream of domain events"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Events"
)]
pub async fn event_stream(_auth: AuthUser, bus: web::Data<EventBus>) -> impl Responder {
    let subscription = bus.subscribe();

    let body = stream::unfold(subscription, |mut subscription| async move {
        loop {
            let event = subscription.next().await?;
            if let Some(frame) = sse_frame(&event) {
                return Some((Ok::<_, actix_web::Error>(frame), subscription));
            }
        }
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_data_lines_with_a_blank_terminator() {
        let frame = sse_frame(&DomainEvent::NoticePublished {
            notice_id: 3,
            audience: "all".into(),
        })
        .unwrap();

        let text = std::str::from_utf8(&frame).unwrap();
        assert!(text.starts_with("data: {"));
        assert!(text.ends_with("\n\n"));
        assert!(text.contains("\"type\":\"notice_published\""));
    }
}
