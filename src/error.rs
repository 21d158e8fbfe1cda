use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use serde_json::json;

use crate::{announcement, chat, message, notification, read, user};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _Chat(#[from] chat::Error),
    #[error(transparent)]
    _Message(#[from] message::Error),
    #[error(transparent)]
    _Read(#[from] read::Error),
    #[error(transparent)]
    _Notification(#[from] notification::Error),
    #[error(transparent)]
    _Announcement(#[from] announcement::Error),

    #[error("invalid request body: {}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
    #[error("invalid path: {}", .0.body_text())]
    InvalidPath(#[from] PathRejection),
    #[error("invalid query: {}", .0.body_text())]
    InvalidQuery(#[from] QueryRejection),
}

impl From<&Error> for StatusCode {
    fn from(e: &Error) -> Self {
        match e {
            Error::_User(e) => e.into(),
            Error::_Chat(e) => e.into(),
            Error::_Message(e) => e.into(),
            Error::_Read(e) => e.into(),
            Error::_Notification(e) => e.into(),
            Error::_Announcement(e) => e.into(),
            Error::InvalidBody(_) | Error::InvalidPath(_) | Error::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);

        let message = if status.is_server_error() {
            error!("{self}");
            "Internal server error".to_owned()
        } else {
            warn!("{self}");
            self.to_string()
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

#[cfg(test)]
mod test {
    use axum::body::to_bytes;

    use super::*;

    async fn body(e: Error) -> (StatusCode, serde_json::Value) {
        let resp = e.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn should_report_client_errors_verbatim() {
        let (status, body) = body(chat::Error::SameUsers.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], chat::Error::SameUsers.to_string());
    }

    #[tokio::test]
    async fn should_map_nested_not_found() {
        let e = read::Error::_Chat(chat::Error::NotFound(chat::Id(42)));

        let (status, _) = body(e.into()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_hide_store_failures() {
        let e = message::Error::_Diesel(diesel::result::Error::NotFound);

        let (status, body) = body(e.into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}
