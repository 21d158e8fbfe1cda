use std::sync::Arc;

use axum::{Router, routing::get};
use service::EventService;

use crate::state::AppState;
use crate::{auth, chat, read, user};

mod context;
mod handler;
pub mod model;
pub mod registry;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn EventService + Send + Sync>;

pub fn endpoints<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/ws", get(handler::ws))
        .with_state(s)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("connection has not joined yet")]
    NotJoined,
    #[error("connection joined as {0}, command was issued for {1}")]
    IdentityMismatch(user::Id, user::Id),

    #[error(transparent)]
    _Auth(#[from] auth::Error),
    #[error(transparent)]
    _Chat(#[from] chat::Error),
    #[error(transparent)]
    _Read(#[from] read::Error),
}
