use chrono::NaiveDateTime;
use diesel::prelude::{Insertable, Queryable, Selectable};
use serde::Serialize;

use crate::{chat, user};

use super::Id;

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Message {
    id: Id,
    chat_id: chat::Id,
    sender_id: user::Id,
    content: String,
    reply_to: Option<Id>,
    created_at: NaiveDateTime,
    is_read: bool,
}

impl Message {
    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub const fn chat_id(&self) -> &chat::Id {
        &self.chat_id
    }

    pub const fn sender_id(&self) -> &user::Id {
        &self.sender_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn reply_to(&self) -> Option<&Id> {
        self.reply_to.as_ref()
    }

    pub const fn created_at(&self) -> &NaiveDateTime {
        &self.created_at
    }

    pub const fn is_read(&self) -> bool {
        self.is_read
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::messages)]
pub struct NewMessage<'a> {
    chat_id: &'a chat::Id,
    sender_id: &'a user::Id,
    content: &'a str,
    reply_to: Option<&'a Id>,
    created_at: NaiveDateTime,
}

impl<'a> NewMessage<'a> {
    pub fn new(
        chat_id: &'a chat::Id,
        sender_id: &'a user::Id,
        content: &'a str,
        reply_to: Option<&'a Id>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            chat_id,
            sender_id,
            content,
            reply_to,
            created_at,
        }
    }

    pub const fn chat_id(&self) -> &chat::Id {
        self.chat_id
    }

    pub const fn created_at(&self) -> &NaiveDateTime {
        &self.created_at
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MessageDto {
    id: Id,
    chat_id: chat::Id,
    sender_id: user::Id,
    content: String,
    reply_to: Option<Id>,
    created_at: NaiveDateTime,
    is_read: bool,
}

impl MessageDto {
    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn is_read(&self) -> bool {
        self.is_read
    }
}

impl From<Message> for MessageDto {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            chat_id: m.chat_id,
            sender_id: m.sender_id,
            content: m.content,
            reply_to: m.reply_to,
            created_at: m.created_at,
            is_read: m.is_read,
        }
    }
}

/// Chat list preview of the newest message.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LastMessage {
    sender_id: user::Id,
    content: String,
    created_at: NaiveDateTime,
    is_read: bool,
}

impl LastMessage {
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl From<Message> for LastMessage {
    fn from(m: Message) -> Self {
        Self {
            sender_id: m.sender_id,
            content: m.content,
            created_at: m.created_at,
            is_read: m.is_read,
        }
    }
}
