use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::events::{ClientEvent, ServerEvent};
use super::hub::LISTENER_BUFFER;
use crate::auth::AuthUser;
use crate::conversations::services::accessible;
use crate::error::{AppError, AppResult};
use crate::messages::services::{post_message, NewMessage};
use crate::state::AppState;

pub async fn ws_handler(State(state): State<AppState>, user: AuthUser, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state, user))
}

async fn serve_socket(socket: WebSocket, state: AppState, user: AuthUser) {
    let listener = Uuid::new_v4();
    info!(user_id = user.id, listener = %listener, "realtime client connected");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(LISTENER_BUFFER);

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "failed to encode realtime event");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "realtime socket error");
                break;
            }
        };
        // No acknowledgement goes back to the emitter; failures are only logged.
        if let Err(e) = handle_event(&state, &user, listener, &tx, &text).await {
            warn!(user_id = user.id, kind = e.kind(), error = %e, "realtime event failed");
        }
    }

    state.hub.drop_listener(listener).await;
    drop(tx);
    let _ = writer.await;
    info!(user_id = user.id, listener = %listener, "realtime client disconnected");
}

async fn handle_event(
    state: &AppState,
    user: &AuthUser,
    listener: Uuid,
    tx: &mpsc::Sender<ServerEvent>,
    text: &str,
) -> AppResult<()> {
    let event: ClientEvent = serde_json::from_str(text)
        .map_err(|e| AppError::validation(format!("Malformed event: {e}")))?;

    match event {
        ClientEvent::JoinConversation(conversation_id) => {
            accessible(state, user, conversation_id).await?;
            state.hub.join(conversation_id, listener, tx.clone()).await;
        }
        ClientEvent::NewMessage(payload) => {
            post_message(
                state,
                user,
                NewMessage {
                    conversation_id: payload.conversation_id,
                    sender_id: payload.sender_id,
                    sender_role: payload.sender_role,
                    content: payload.content,
                },
            )
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[tokio::test]
    async fn malformed_frames_are_validation_errors() {
        let state = AppState::fake();
        let user = AuthUser {
            id: 1,
            code: "ACM000001".into(),
            role: Role::Client,
        };
        let (tx, _rx) = mpsc::channel(1);
        let err = handle_event(&state, &user, Uuid::new_v4(), &tx, "not json")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn blank_socket_message_never_reaches_storage() {
        let state = AppState::fake();
        let user = AuthUser {
            id: 1,
            code: "ACM000001".into(),
            role: Role::Client,
        };
        let (tx, _rx) = mpsc::channel(1);
        let frame = r#"{"event":"newMessage","data":{"conversationId":4,"content":"   "}}"#;
        let err = handle_event(&state, &user, Uuid::new_v4(), &tx, frame)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(state.hub.listener_count(4).await, 0);
    }

    #[tokio::test]
    async fn upgrade_requires_a_token() {
        use axum::{body::Body, http::Request, http::StatusCode};
        use tower::ServiceExt;

        let res = crate::test_support::app()
            .oneshot(Request::get("/api/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
