use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn service::AuthService + Send + Sync>;

/// Claims of a `join` token: `sub` is the user id.
#[derive(Deserialize, Serialize, Clone, Debug)]
struct TokenClaims {
    sub: String,
    exp: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("join token is required")]
    Unauthorized,
    #[error("join token was issued for another user")]
    Forbidden,

    #[error(transparent)]
    _JsonWebtoken(#[from] jsonwebtoken::errors::Error),
}
