use chrono::NaiveDateTime;
use diesel::prelude::{Insertable, Queryable, Selectable};
use serde::Serialize;

use crate::{message, user};

use super::{Id, RecipientType};

#[derive(Queryable, Selectable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::announcements)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Announcement {
    id: Id,
    teacher_id: user::Id,
    title: String,
    content: String,
    recipient_type: RecipientType,
    recipient_id: Option<String>,
    is_pinned: bool,
    created_at: NaiveDateTime,
}

impl Announcement {
    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn recipient_type(&self) -> &RecipientType {
        &self.recipient_type
    }

    pub const fn is_pinned(&self) -> bool {
        self.is_pinned
    }

    /// Notification body: title followed by the start of the content.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.title, message::preview(&self.content))
    }
}

/// Who an announcement is addressed to.
#[derive(Debug, Clone, PartialEq)]
pub enum Audience {
    All,
    Group(String),
    Individual(user::Id),
}

impl Audience {
    pub fn parse(recipient_type: &str, recipient_id: Option<&str>) -> super::Result<Self> {
        let recipient_type = recipient_type
            .parse::<RecipientType>()
            .map_err(|_| super::Error::InvalidRecipientType(recipient_type.to_string()))?;

        let recipient_id = recipient_id.map(str::trim).filter(|id| !id.is_empty());

        match (recipient_type, recipient_id) {
            (RecipientType::All, _) => Ok(Self::All),
            (_, None) => Err(super::Error::MissingField("recipient_id")),
            (RecipientType::Group, Some(group)) => Ok(Self::Group(group.to_string())),
            (RecipientType::Individual, Some(id)) => id
                .parse::<i32>()
                .map(|id| Self::Individual(user::Id(id)))
                .map_err(|_| super::Error::InvalidRecipient(id.to_string())),
        }
    }

    pub const fn recipient_type(&self) -> RecipientType {
        match self {
            Self::All => RecipientType::All,
            Self::Group(_) => RecipientType::Group,
            Self::Individual(_) => RecipientType::Individual,
        }
    }

    pub fn recipient_id(&self) -> Option<String> {
        match self {
            Self::All => None,
            Self::Group(group) => Some(group.clone()),
            Self::Individual(id) => Some(id.to_string()),
        }
    }
}

/// A validated announcement that has not been stored yet.
#[derive(Debug, Clone)]
pub struct Draft {
    teacher_id: user::Id,
    title: String,
    content: String,
    audience: Audience,
    is_pinned: bool,
}

impl Draft {
    pub fn new(
        teacher_id: user::Id,
        title: &str,
        content: &str,
        audience: Audience,
        is_pinned: bool,
    ) -> super::Result<Self> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() {
            return Err(super::Error::MissingField("title"));
        }
        if content.is_empty() {
            return Err(super::Error::MissingField("content"));
        }

        Ok(Self {
            teacher_id,
            title: title.to_string(),
            content: content.to_string(),
            audience,
            is_pinned,
        })
    }

    pub const fn teacher_id(&self) -> &user::Id {
        &self.teacher_id
    }

    pub const fn audience(&self) -> &Audience {
        &self.audience
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::announcements)]
pub struct NewAnnouncement<'a> {
    teacher_id: &'a user::Id,
    title: &'a str,
    content: &'a str,
    recipient_type: RecipientType,
    recipient_id: Option<String>,
    is_pinned: bool,
    created_at: NaiveDateTime,
}

impl<'a> NewAnnouncement<'a> {
    pub fn new(draft: &'a Draft, created_at: NaiveDateTime) -> Self {
        Self {
            teacher_id: &draft.teacher_id,
            title: &draft.title,
            content: &draft.content,
            recipient_type: draft.audience.recipient_type(),
            recipient_id: draft.audience.recipient_id(),
            is_pinned: draft.is_pinned,
            created_at,
        }
    }
}
