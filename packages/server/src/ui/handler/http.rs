//! HTTP API handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::protocol::ConnectedUser;

use super::super::state::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Snapshot of currently connected users and their presence.
pub async fn get_presence(State(state): State<Arc<AppState>>) -> Json<Vec<ConnectedUser>> {
    Json(state.hub.connected_users().await)
}

/// Push request from another platform subsystem: either a single user or a
/// whole cohort as target.
#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    #[serde(flatten)]
    pub target: NotifyTarget,
    pub payload: Value,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum NotifyTarget {
    UserId(String),
    CohortId(String),
}

/// `POST /api/notifications` — drive the [`crate::notify::Notifier`]
/// interface over HTTP. Delivery is best-effort; 202 only means the push
/// was handed to the gateway.
pub async fn push_notification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NotifyRequest>,
) -> StatusCode {
    match req.target {
        NotifyTarget::UserId(user_id) => {
            tracing::debug!("Pushing notification to user '{}'", user_id);
            state.notifier.notify_user(&user_id, req.payload).await;
        }
        NotifyTarget::CohortId(cohort_id) => {
            tracing::debug!("Pushing notification to cohort '{}'", cohort_id);
            state.notifier.notify_cohort(&cohort_id, req.payload).await;
        }
    }
    StatusCode::ACCEPTED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenVerifier;
    use crate::hub::Hub;
    use crate::notify::MockNotifier;
    use agora_shared::time::FixedClock;
    use serde_json::json;

    fn state_with_notifier(notifier: MockNotifier) -> Arc<AppState> {
        Arc::new(AppState {
            hub: Arc::new(Hub::new(Arc::new(FixedClock::new(0)))),
            verifier: TokenVerifier::new("test-secret"),
            notifier: Arc::new(notifier),
        })
    }

    #[tokio::test]
    async fn test_notify_request_parses_user_target() {
        // given:
        let body = r#"{"userId":"alice","payload":{"kind":"ping"}}"#;

        // when:
        let req: NotifyRequest = serde_json::from_str(body).unwrap();

        // then:
        assert_eq!(req.target, NotifyTarget::UserId("alice".to_string()));
        assert_eq!(req.payload, json!({"kind": "ping"}));
    }

    #[tokio::test]
    async fn test_push_notification_forwards_user_target_to_the_notifier() {
        // given:
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify_user()
            .withf(|user_id, payload| user_id == "alice" && payload["kind"] == "ping")
            .times(1)
            .returning(|_, _| ());
        let state = state_with_notifier(notifier);

        // when:
        let status = push_notification(
            State(state),
            Json(NotifyRequest {
                target: NotifyTarget::UserId("alice".to_string()),
                payload: json!({"kind": "ping"}),
            }),
        )
        .await;

        // then:
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_push_notification_forwards_cohort_target_to_the_notifier() {
        // given:
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify_cohort()
            .withf(|cohort_id, _| cohort_id == "c1")
            .times(1)
            .returning(|_, _| ());
        let state = state_with_notifier(notifier);

        // when:
        let status = push_notification(
            State(state),
            Json(NotifyRequest {
                target: NotifyTarget::CohortId("c1".to_string()),
                payload: json!({"kind": "session_starting"}),
            }),
        )
        .await;

        // then:
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_health_check_reports_ok() {
        // when:
        let Json(body) = health_check().await;

        // then:
        assert_eq!(body, json!({"status": "ok"}));
    }
}
