use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::MissingField(_) => Self::BAD_REQUEST,
            super::Error::_Chat(e) => e.into(),
            super::Error::_R2d2(_) | super::Error::_Diesel(_) => Self::INTERNAL_SERVER_ERROR,
        }
    }
}

pub(super) mod api {
    use axum::extract::State;
    use serde::Deserialize;
    use serde_json::json;

    use crate::extract::{Json, Path, Query};
    use crate::{Success, chat, message, read, read::model::ReadReceipt, user};

    #[derive(Deserialize)]
    pub struct MarkChatReadParams {
        user_id: Option<user::Id>,
    }

    pub async fn mark_chat_read(
        read_service: State<read::Service>,
        Path(chat_id): Path<chat::Id>,
        Json(params): Json<MarkChatReadParams>,
    ) -> crate::Result<Success<ReadReceipt>> {
        let user_id = params.user_id.ok_or(read::Error::MissingField("user_id"))?;

        let receipt = read_service.mark_chat_read(&chat_id, &user_id).await?;
        Ok(Success(receipt))
    }

    #[derive(Deserialize)]
    pub struct MarkReadParams {
        user_id: Option<user::Id>,
        message_ids: Option<Vec<message::Id>>,
    }

    pub async fn mark_read(
        read_service: State<read::Service>,
        Path(chat_id): Path<chat::Id>,
        Json(params): Json<MarkReadParams>,
    ) -> crate::Result<Success<ReadReceipt>> {
        let user_id = params.user_id.ok_or(read::Error::MissingField("user_id"))?;
        let ids = params
            .message_ids
            .ok_or(read::Error::MissingField("message_ids"))?;

        let receipt = read_service.mark_read(&chat_id, &user_id, &ids).await?;
        Ok(Success(receipt))
    }

    #[derive(Deserialize)]
    pub struct UnreadCountParams {
        user_id: Option<user::Id>,
    }

    pub async fn unread_count(
        read_service: State<read::Service>,
        Path(chat_id): Path<chat::Id>,
        Query(params): Query<UnreadCountParams>,
    ) -> crate::Result<Success<serde_json::Value>> {
        let user_id = params.user_id.ok_or(read::Error::MissingField("user_id"))?;

        let count = read_service.unread_count(&chat_id, &user_id).await?;
        Ok(Success(json!({ "unread_count": count })))
    }
}
