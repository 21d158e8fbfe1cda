use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::NotFound(_) => Self::NOT_FOUND,
            super::Error::EmptyContent
            | super::Error::MissingField(_)
            | super::Error::ForeignReply(_) => Self::BAD_REQUEST,
            super::Error::_Chat(e) => e.into(),
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

    use crate::extract::{Json, Path, Query};
    use crate::{
        Success, chat,
        message::{self, model::MessageDto},
        page, user,
    };

    #[derive(Deserialize)]
    pub struct SendParams {
        sender_id: Option<user::Id>,
        content: Option<String>,
        reply_to: Option<message::Id>,
    }

    pub async fn send(
        message_service: State<message::Service>,
        Path(chat_id): Path<chat::Id>,
        Json(params): Json<SendParams>,
    ) -> crate::Result<(StatusCode, Success<MessageDto>)> {
        let sender = params
            .sender_id
            .ok_or(message::Error::MissingField("sender_id"))?;
        let content = params
            .content
            .ok_or(message::Error::MissingField("content"))?;

        let message = message_service
            .send(&chat_id, &sender, &content, params.reply_to.as_ref())
            .await?;

        Ok((StatusCode::CREATED, Success(message)))
    }

    #[derive(Deserialize)]
    pub struct FindPageParams {
        page: Option<i64>,
        per_page: Option<i64>,
    }

    pub async fn find_page(
        message_service: State<message::Service>,
        Path(chat_id): Path<chat::Id>,
        Query(params): Query<FindPageParams>,
    ) -> crate::Result<Success<page::Page<MessageDto>>> {
        let params = page::Params::from_query(params.page, params.per_page);

        let page = message_service.find_page(&chat_id, &params).await?;
        Ok(Success(page))
    }
}
