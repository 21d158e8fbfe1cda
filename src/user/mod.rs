use std::sync::Arc;

use axum::http::StatusCode;
use repository::UserRepository;

use crate::integration::db::sql_id;

pub mod model;
pub mod repository;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn UserRepository + Send + Sync>;

sql_id!(Id);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("user not found: {0}")]
    NotFound(Id),

    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}

impl From<&Error> for StatusCode {
    fn from(e: &Error) -> Self {
        match e {
            Error::NotFound(_) => Self::NOT_FOUND,
            Error::_R2d2(_) | Error::_Diesel(_) => Self::INTERNAL_SERVER_ERROR,
        }
    }
}
