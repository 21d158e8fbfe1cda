use chrono::NaiveDateTime;
use diesel::prelude::{Identifiable, Insertable, Queryable, Selectable};
use serde::Serialize;

use crate::message::model::LastMessage;
use crate::user;

use super::{Id, Kind};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::chats)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Chat {
    id: Id,
    kind: Kind,
    subject: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Chat {
    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub const fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub const fn created_at(&self) -> &NaiveDateTime {
        &self.created_at
    }

    pub const fn updated_at(&self) -> &NaiveDateTime {
        &self.updated_at
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::chats)]
pub struct NewChat<'a> {
    kind: Kind,
    subject: Option<&'a str>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl<'a> NewChat<'a> {
    pub fn new(kind: Kind, subject: Option<&'a str>, now: NaiveDateTime) -> Self {
        Self {
            kind,
            subject,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::chat_participants)]
pub struct NewParticipant<'a> {
    chat_id: &'a Id,
    user_id: &'a user::Id,
    joined_at: NaiveDateTime,
}

impl<'a> NewParticipant<'a> {
    pub fn new(chat_id: &'a Id, user_id: &'a user::Id, joined_at: NaiveDateTime) -> Self {
        Self {
            chat_id,
            user_id,
            joined_at,
        }
    }
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::chat_participants)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Participant {
    chat_id: Id,
    user_id: user::Id,
    joined_at: NaiveDateTime,
    last_read_at: Option<NaiveDateTime>,
}

impl Participant {
    pub const fn chat_id(&self) -> &Id {
        &self.chat_id
    }

    pub const fn user_id(&self) -> &user::Id {
        &self.user_id
    }

    pub const fn joined_at(&self) -> &NaiveDateTime {
        &self.joined_at
    }

    /// Watermark: everything created up to this point has been read.
    pub const fn last_read_at(&self) -> Option<&NaiveDateTime> {
        self.last_read_at.as_ref()
    }
}

/// Outcome of creating a personal chat: the pair shares at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Created {
    New(Id),
    Existing(Id),
}

impl Created {
    pub const fn id(&self) -> &Id {
        match self {
            Created::New(id) | Created::Existing(id) => id,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct ChatDto {
    id: Id,
    #[serde(rename = "type")]
    kind: Kind,
    subject: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    last_message: Option<LastMessage>,
    unread_count: i64,
    partner_name: Option<String>,
}

impl ChatDto {
    pub fn new(
        chat: Chat,
        last_message: Option<LastMessage>,
        unread_count: i64,
        partner_name: Option<String>,
    ) -> Self {
        Self {
            id: chat.id,
            kind: chat.kind,
            subject: chat.subject,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
            last_message,
            unread_count,
            partner_name,
        }
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub const fn unread_count(&self) -> i64 {
        self.unread_count
    }

    pub const fn last_message(&self) -> Option<&LastMessage> {
        self.last_message.as_ref()
    }

    pub fn partner_name(&self) -> Option<&str> {
        self.partner_name.as_deref()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ParticipantDto {
    user_id: user::Id,
    full_name: String,
}

impl ParticipantDto {
    pub fn new(user_id: user::Id, full_name: impl Into<String>) -> Self {
        Self {
            user_id,
            full_name: full_name.into(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct ChatInfoDto {
    id: Id,
    #[serde(rename = "type")]
    kind: Kind,
    subject: Option<String>,
    participants: Vec<ParticipantDto>,
}

impl ChatInfoDto {
    pub fn new(chat: Chat, participants: Vec<ParticipantDto>) -> Self {
        Self {
            id: chat.id,
            kind: chat.kind,
            subject: chat.subject,
            participants,
        }
    }

    pub fn participants(&self) -> &[ParticipantDto] {
        &self.participants
    }
}
