use std::sync::Arc;

use axum::{Router, routing::get};
use repository::AnnouncementRepository;
use service::AnnouncementService;

use crate::integration::db::{sql_id, sql_text_enum};
use crate::{state::AppState, user};

mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn AnnouncementRepository + Send + Sync>;
pub type Service = Arc<dyn AnnouncementService + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route(
            "/announcements",
            get(handler::api::find_for_user).post(handler::api::create),
        )
        .route("/announcements/{id}", get(handler::api::find_one))
        .with_state(s)
}

sql_id!(Id);

sql_text_enum!(RecipientType {
    All => "all",
    Group => "group",
    Individual => "individual",
});

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("announcement not found: {0}")]
    NotFound(Id),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid recipient_type: {0}, must be \"all\", \"group\" or \"individual\"")]
    InvalidRecipientType(String),
    #[error("invalid recipient_id: {0}")]
    InvalidRecipient(String),

    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}
