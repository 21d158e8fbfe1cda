use std::sync::Arc;

use tokio::sync::{Notify, RwLock};

use crate::user;

use super::model::ConnectionId;

#[derive(Clone)]
pub struct Ws {
    pub id: ConnectionId,
    user_id: Arc<RwLock<Option<user::Id>>>,
    pub close: Arc<Notify>,
}

impl Ws {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            user_id: Arc::new(RwLock::new(None)),
            close: Arc::new(Notify::new()),
        }
    }
}

impl Ws {
    pub async fn set_user_id(&self, user_id: user::Id) {
        *self.user_id.write().await = Some(user_id);
    }

    /// Identity declared by the last successful `join`.
    pub async fn get_user_id(&self) -> super::Result<user::Id> {
        self.user_id
            .read()
            .await
            .ok_or(super::Error::NotJoined)
    }
}
