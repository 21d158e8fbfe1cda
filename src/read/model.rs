use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{chat, message, user};

/// Outcome of one read-tracking transaction.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ReadReceipt {
    chat_id: chat::Id,
    user_id: user::Id,
    message_ids: Vec<message::Id>,
    read_at: NaiveDateTime,
}

impl ReadReceipt {
    pub fn new(
        chat_id: chat::Id,
        user_id: user::Id,
        message_ids: Vec<message::Id>,
        read_at: NaiveDateTime,
    ) -> Self {
        Self {
            chat_id,
            user_id,
            message_ids,
            read_at,
        }
    }

    pub const fn chat_id(&self) -> &chat::Id {
        &self.chat_id
    }

    pub const fn user_id(&self) -> &user::Id {
        &self.user_id
    }

    pub fn message_ids(&self) -> &[message::Id] {
        &self.message_ids
    }

    pub const fn read_at(&self) -> &NaiveDateTime {
        &self.read_at
    }
}
