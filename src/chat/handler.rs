use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::NotFound(_) | super::Error::NotParticipant(_, _) => Self::NOT_FOUND,
            super::Error::SameUsers
            | super::Error::MissingField(_)
            | super::Error::InvalidKind(_) => Self::BAD_REQUEST,
            super::Error::_User(e) => e.into(),
            super::Error::_Message(e) => e.as_ref().into(),
            super::Error::_Read(e) => e.as_ref().into(),
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
        chat::{self, Kind, model::ChatDto, model::ChatInfoDto},
        user,
    };

    #[derive(Deserialize)]
    pub struct FindAllParams {
        user_id: Option<user::Id>,
        #[serde(rename = "type")]
        kind: Option<String>,
    }

    pub async fn find_all(
        chat_service: State<chat::Service>,
        Query(params): Query<FindAllParams>,
    ) -> crate::Result<Success<Vec<ChatDto>>> {
        let user_id = params.user_id.ok_or(chat::Error::MissingField("user_id"))?;
        let kind = match params.kind.as_deref() {
            None | Some("all") => None,
            Some(k) => Some(
                k.parse::<Kind>()
                    .map_err(|_| chat::Error::InvalidKind(k.to_string()))?,
            ),
        };

        let chats = chat_service.find_all(&user_id, kind).await?;
        Ok(Success(chats))
    }

    pub async fn find_one(
        chat_service: State<chat::Service>,
        Path(id): Path<chat::Id>,
    ) -> crate::Result<Success<ChatInfoDto>> {
        let chat = chat_service.find_info(&id).await?;
        Ok(Success(chat))
    }

    #[derive(Deserialize)]
    pub struct CreatePersonalParams {
        student_id: Option<user::Id>,
        teacher_id: Option<user::Id>,
    }

    pub async fn create_personal(
        chat_service: State<chat::Service>,
        Json(params): Json<CreatePersonalParams>,
    ) -> crate::Result<(StatusCode, Success<serde_json::Value>)> {
        let student = params
            .student_id
            .ok_or(chat::Error::MissingField("student_id"))?;
        let teacher = params
            .teacher_id
            .ok_or(chat::Error::MissingField("teacher_id"))?;

        let created = chat_service.create_personal(&student, &teacher).await?;
        let status = match created {
            chat::model::Created::New(_) => StatusCode::CREATED,
            chat::model::Created::Existing(_) => StatusCode::OK,
        };

        Ok((status, Success(json!({ "chat_id": created.id() }))))
    }

    #[derive(Deserialize)]
    pub struct CreateGroupParams {
        teacher_id: Option<user::Id>,
        group_name: Option<String>,
        subject: Option<String>,
    }

    pub async fn create_group(
        chat_service: State<chat::Service>,
        Json(params): Json<CreateGroupParams>,
    ) -> crate::Result<(StatusCode, Success<serde_json::Value>)> {
        let teacher = params
            .teacher_id
            .ok_or(chat::Error::MissingField("teacher_id"))?;
        let group_name = params
            .group_name
            .ok_or(chat::Error::MissingField("group_name"))?;
        let subject = params.subject.ok_or(chat::Error::MissingField("subject"))?;

        let id = chat_service
            .create_group(&teacher, &group_name, &subject)
            .await?;

        Ok((StatusCode::CREATED, Success(json!({ "chat_id": id }))))
    }
}
