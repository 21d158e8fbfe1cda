use std::fmt::Display;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::model::MessageDto;
use crate::{chat, message, user};

/// Identifies one live WebSocket connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Join {
        user_id: user::Id,
        token: Option<String>,
    },
    JoinChat {
        chat_id: chat::Id,
    },
    LeaveChat {
        chat_id: chat::Id,
    },
    MarkMessagesRead {
        chat_id: chat::Id,
        user_id: user::Id,
        message_ids: Vec<message::Id>,
    },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    NewMessage {
        chat_id: chat::Id,
        message: MessageDto,
    },
    MessageRead {
        chat_id: chat::Id,
        user_id: user::Id,
        message_ids: Vec<message::Id>,
        timestamp: NaiveDateTime,
    },
    UnreadCountUpdated {
        user_id: user::Id,
        chat_id: chat::Id,
    },
}
