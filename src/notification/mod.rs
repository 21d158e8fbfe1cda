use std::sync::Arc;

use axum::{Router, routing::get, routing::post};
use repository::NotificationRepository;
use service::NotificationService;

use crate::integration::db::{sql_id, sql_text_enum};
use crate::{state::AppState, user};

mod handler;
pub mod model;
pub mod push;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn NotificationRepository + Send + Sync>;
pub type Service = Arc<dyn NotificationService + Send + Sync>;
pub type PushClient = Arc<dyn push::PushClient + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/push-token", post(handler::api::register_push_token))
        .route("/notifications", get(handler::api::find_page))
        .route("/notifications/mark-read", post(handler::api::mark_read))
        .route("/test-notification", post(handler::api::send_test))
        .with_state(s)
}

sql_id!(Id);

sql_text_enum!(Category {
    Message => "message",
    Grade => "grade",
    System => "system",
});

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid push token: {0}")]
    InvalidToken(String),
    #[error("invalid notification type: {0}")]
    InvalidCategory(String),
    #[error("no push destination registered for user {0}")]
    NoDestination(user::Id),

    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _Json(#[from] serde_json::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}
