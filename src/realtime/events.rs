use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::messages::MessageView;

/// Frames a connected client may send, as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinConversation(i64),
    NewMessage(NewMessagePayload),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessagePayload {
    pub conversation_id: i64,
    pub sender_id: Option<i64>,
    pub sender_role: Option<Role>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    MessageReceived(MessageView),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_and_new_message() {
        let join: ClientEvent =
            serde_json::from_str(r#"{"event":"joinConversation","data":12}"#).unwrap();
        assert!(matches!(join, ClientEvent::JoinConversation(12)));

        let msg: ClientEvent = serde_json::from_str(
            r#"{"event":"newMessage","data":{"conversationId":12,"senderId":3,"senderRole":"client","content":"hi"}}"#,
        )
        .unwrap();
        match msg {
            ClientEvent::NewMessage(p) => {
                assert_eq!(p.conversation_id, 12);
                assert_eq!(p.sender_id, Some(3));
                assert_eq!(p.sender_role, Some(Role::Client));
                assert_eq!(p.content, "hi");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_events() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"event":"leaveConversation","data":1}"#).is_err());
    }
}
