use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use repository::ReadRepository;
use service::ReadService;

use crate::{chat, state::AppState};

mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn ReadRepository + Send + Sync>;
pub type Service = Arc<dyn ReadService + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/chats/{id}/mark-read", post(handler::api::mark_chat_read))
        .route("/chats/{id}/messages/read", post(handler::api::mark_read))
        .route("/chats/{id}/unread-count", get(handler::api::unread_count))
        .with_state(s)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    _Chat(#[from] chat::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}
