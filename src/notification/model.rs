use chrono::NaiveDateTime;
use diesel::prelude::{Insertable, Queryable, Selectable};
use log::warn;
use serde::Serialize;
use serde_json::Value;

use crate::user;

use super::{Category, Id};

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Notification {
    id: Id,
    user_id: user::Id,
    title: String,
    body: String,
    category: Category,
    reference_id: Option<i32>,
    payload: Option<String>,
    is_read: bool,
    created_at: NaiveDateTime,
}

impl Notification {
    pub const fn user_id(&self) -> &user::Id {
        &self.user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub const fn category(&self) -> &Category {
        &self.category
    }

    pub const fn reference_id(&self) -> Option<i32> {
        self.reference_id
    }

    pub const fn is_read(&self) -> bool {
        self.is_read
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::notifications)]
pub struct NewNotification<'a> {
    user_id: &'a user::Id,
    title: &'a str,
    body: &'a str,
    category: Category,
    reference_id: Option<i32>,
    payload: Option<&'a str>,
    created_at: NaiveDateTime,
}

impl<'a> NewNotification<'a> {
    pub fn new(
        user_id: &'a user::Id,
        dispatch: &'a Dispatch,
        payload: Option<&'a str>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            user_id,
            title: &dispatch.title,
            body: &dispatch.body,
            category: dispatch.category,
            reference_id: dispatch.reference_id,
            payload,
            created_at,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct NotificationDto {
    id: Id,
    user_id: user::Id,
    title: String,
    body: String,
    #[serde(rename = "type")]
    category: Category,
    reference_id: Option<i32>,
    payload: Option<Value>,
    is_read: bool,
    created_at: NaiveDateTime,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        let payload = n.payload.and_then(|p| match serde_json::from_str(&p) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Skipping malformed payload of notification {}: {e}", n.id);
                None
            }
        });

        Self {
            id: n.id,
            user_id: n.user_id,
            title: n.title,
            body: n.body,
            category: n.category,
            reference_id: n.reference_id,
            payload,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

/// One fan-out request: a notification per recipient plus a push to each of their destinations.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    recipients: Vec<user::Id>,
    category: Category,
    title: String,
    body: String,
    reference_id: Option<i32>,
    payload: Option<Value>,
    push_title: Option<String>,
    push_body: Option<String>,
}

impl Dispatch {
    pub fn new(
        recipients: Vec<user::Id>,
        category: Category,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipients,
            category,
            title: title.into(),
            body: body.into(),
            reference_id: None,
            payload: None,
            push_title: None,
            push_body: None,
        }
    }

    pub fn reference(self, reference_id: i32) -> Self {
        Self {
            reference_id: Some(reference_id),
            ..self
        }
    }

    pub fn payload(self, payload: Value) -> Self {
        Self {
            payload: Some(payload),
            ..self
        }
    }

    /// Overrides the text shown by the device; defaults to the notification's own.
    pub fn push(self, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            push_title: Some(title.into()),
            push_body: Some(body.into()),
            ..self
        }
    }

    pub fn recipients(&self) -> &[user::Id] {
        &self.recipients
    }

    pub const fn category(&self) -> &Category {
        &self.category
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn payload_ref(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn push_message(&self, to: &str) -> PushMessage {
        let mut data = self.payload.clone().unwrap_or_else(|| serde_json::json!({}));
        if let Value::Object(map) = &mut data {
            map.insert("type".into(), Value::from(self.category.as_str()));
            if let Some(id) = self.reference_id {
                map.insert("reference_id".into(), Value::from(id));
            }
        }

        PushMessage {
            to: to.to_string(),
            title: self.push_title.clone().unwrap_or_else(|| self.title.clone()),
            body: self.push_body.clone().unwrap_or_else(|| self.body.clone()),
            data,
            sound: "default",
        }
    }
}

/// Wire format of a single push provider message.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PushMessage {
    to: String,
    title: String,
    body: String,
    data: Value,
    sound: &'static str,
}

impl PushMessage {
    pub fn new(to: &str, title: &str, body: &str) -> Self {
        Self {
            to: to.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data: serde_json::json!({}),
            sound: "default",
        }
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub const fn data(&self) -> &Value {
        &self.data
    }
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub persisted: usize,
    pub delivered: usize,
    pub failed: usize,
}
