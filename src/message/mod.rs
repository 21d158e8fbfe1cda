use std::sync::Arc;

use axum::{Router, routing::get};
use repository::MessageRepository;
use service::MessageService;

use crate::integration::db::sql_id;
use crate::{chat, state::AppState};

mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn MessageRepository + Send + Sync>;
pub type Service = Arc<dyn MessageService + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route(
            "/chats/{id}/messages",
            get(handler::api::find_page).post(handler::api::send),
        )
        .with_state(s)
}

sql_id!(Id);

/// Characters of a message kept in notification bodies and previews.
pub const PREVIEW_LEN: usize = 100;

pub fn preview(content: &str) -> String {
    content.chars().take(PREVIEW_LEN).collect()
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("message not found: {0}")]
    NotFound(Id),
    #[error("message content is empty")]
    EmptyContent,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("replied message {0} does not belong to this chat")]
    ForeignReply(Id),

    #[error(transparent)]
    _Chat(#[from] chat::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}
