use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use repository::ChatRepository;
use service::ChatService;

use crate::integration::db::{sql_id, sql_text_enum};
use crate::{message, read, state::AppState, user};

mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn ChatRepository + Send + Sync>;
pub type Service = Arc<dyn ChatService + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/chats", get(handler::api::find_all))
        .route("/chats/personal", post(handler::api::create_personal))
        .route("/chats/group", post(handler::api::create_group))
        .route("/chats/{id}", get(handler::api::find_one))
        .with_state(s)
}

sql_id!(Id);

sql_text_enum!(Kind {
    Personal => "personal",
    Group => "group",
});

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("chat not found: {0}")]
    NotFound(Id),
    #[error("user {1} is not a participant of chat {0}")]
    NotParticipant(Id, user::Id),
    #[error("personal chat requires two distinct users")]
    SameUsers,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid chat type: {0}")]
    InvalidKind(String),

    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _Message(#[from] Box<message::Error>),
    #[error(transparent)]
    _Read(#[from] Box<read::Error>),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}
