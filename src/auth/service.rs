use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use log::{debug, warn};

use crate::user;

use super::TokenClaims;

pub trait AuthService {
    /// Checks that a connection may act as `user_id`.
    fn verify_join(&self, user_id: &user::Id, token: Option<&str>) -> super::Result<()>;
}

pub struct AuthServiceImpl {
    decoding_key: Option<DecodingKey>,
    jwt_validator: Validation,
}

impl AuthServiceImpl {
    /// Without a secret every declared identity is trusted.
    pub fn new(secret: Option<&str>) -> Self {
        if secret.is_none() {
            warn!("JOIN_SECRET is not set, WS identities are trusted as declared");
        }

        Self {
            decoding_key: secret.map(|s| DecodingKey::from_secret(s.as_bytes())),
            jwt_validator: Validation::new(Algorithm::HS256),
        }
    }
}

impl AuthService for AuthServiceImpl {
    fn verify_join(&self, user_id: &user::Id, token: Option<&str>) -> super::Result<()> {
        let Some(key) = &self.decoding_key else {
            return Ok(());
        };

        let token = token.ok_or(super::Error::Unauthorized)?;
        let claims = decode::<TokenClaims>(token, key, &self.jwt_validator)?.claims;

        if claims.sub != user_id.to_string() {
            return Err(super::Error::Forbidden);
        }

        debug!("join token of user {user_id} verified");
        Ok(())
    }
}
