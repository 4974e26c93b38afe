//! Direct messages exchanged over the chat socket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::{MessageId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

/// History entry sent when a socket connects.
///
/// `reciever_id` keeps the spelling existing clients read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender_id: UserId,
    pub reciever_id: UserId,
    pub content: String,
    /// RFC 3339
    pub timestamp: String,
    pub is_read: bool,
}

impl From<Message> for HistoryEntry {
    fn from(message: Message) -> Self {
        Self {
            sender_id: message.sender_id,
            reciever_id: message.receiver_id,
            content: message.content,
            timestamp: message.timestamp.to_rfc3339(),
            is_read: message.is_read,
        }
    }
}

/// Frame a client sends: `{"message": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingFrame {
    pub message: String,
}

/// Frame broadcast to the room for each new message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingFrame {
    pub message: String,
    pub sender_id: UserId,
}

/// `chat_{smaller}_{larger}`, identical for both participants.
pub fn room_name(a: UserId, b: UserId) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("chat_{}_{}", low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_name_is_symmetric() {
        let a = UserId::new();
        let b = UserId::new();
        assert_eq!(room_name(a, b), room_name(b, a));
        assert!(room_name(a, b).starts_with("chat_"));
    }

    #[test]
    fn history_uses_rfc3339_and_legacy_key() {
        let message = Message {
            id: MessageId::new(),
            sender_id: UserId::new(),
            receiver_id: UserId::new(),
            content: "hi".to_string(),
            timestamp: Utc::now(),
            is_read: false,
        };
        let json = serde_json::to_value(HistoryEntry::from(message.clone())).unwrap();
        assert_eq!(json["reciever_id"], message.receiver_id.to_string());
        assert!(DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn incoming_frame_requires_message() {
        assert!(serde_json::from_str::<IncomingFrame>(r#"{"text":"hi"}"#).is_err());
        let frame: IncomingFrame = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(frame.message, "hi");
    }
}
