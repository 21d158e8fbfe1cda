use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::NotFound(_) => Self::NOT_FOUND,
            super::Error::MissingField(_)
            | super::Error::InvalidRecipientType(_)
            | super::Error::InvalidRecipient(_) => Self::BAD_REQUEST,
            super::Error::_User(e) => e.into(),
            super::Error::_R2d2(_) | super::Error::_Diesel(_) => Self::INTERNAL_SERVER_ERROR,
        }
    }
}

pub(super) mod api {
    use axum::{
        extract::State,
        http::StatusCode,
    };
    use serde::Deserialize;
    use serde_json::json;

    use crate::extract::{Json, Path, Query};
    use crate::{
        Success,
        announcement::{
            self,
            model::{Announcement, Audience, Draft},
        },
        user,
    };

    #[derive(Deserialize)]
    pub struct CreateParams {
        teacher_id: Option<user::Id>,
        title: Option<String>,
        content: Option<String>,
        recipient_type: Option<String>,
        recipient_id: Option<serde_json::Value>,
        #[serde(default)]
        is_pinned: bool,
    }

    pub async fn create(
        announcement_service: State<announcement::Service>,
        Json(params): Json<CreateParams>,
    ) -> crate::Result<(StatusCode, Success<serde_json::Value>)> {
        let teacher = params
            .teacher_id
            .ok_or(announcement::Error::MissingField("teacher_id"))?;
        let title = params
            .title
            .ok_or(announcement::Error::MissingField("title"))?;
        let content = params
            .content
            .ok_or(announcement::Error::MissingField("content"))?;
        let recipient_type = params
            .recipient_type
            .ok_or(announcement::Error::MissingField("recipient_type"))?;

        // Clients send group names as strings and user ids as numbers.
        let recipient_id = match params.recipient_id {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let audience = Audience::parse(&recipient_type, recipient_id.as_deref())?;
        let draft = Draft::new(teacher, &title, &content, audience, params.is_pinned)?;

        let announcement = announcement_service.create(draft).await?;

        Ok((
            StatusCode::CREATED,
            Success(json!({ "announcement_id": announcement.id() })),
        ))
    }

    pub async fn find_one(
        announcement_service: State<announcement::Service>,
        Path(id): Path<announcement::Id>,
    ) -> crate::Result<Success<Announcement>> {
        let announcement = announcement_service.find_one(&id).await?;
        Ok(Success(announcement))
    }

    #[derive(Deserialize)]
    pub struct FindForUserParams {
        user_id: Option<user::Id>,
    }

    pub async fn find_for_user(
        announcement_service: State<announcement::Service>,
        Query(params): Query<FindForUserParams>,
    ) -> crate::Result<Success<Vec<Announcement>>> {
        let user_id = params
            .user_id
            .ok_or(announcement::Error::MissingField("user_id"))?;

        let announcements = announcement_service.find_for_user(&user_id).await?;
        Ok(Success(announcements))
    }
}
