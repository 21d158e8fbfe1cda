use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::{Mutex, mpsc};

use crate::{chat, user};

use super::model::{ConnectionId, Event};
use super::registry::Registry;

#[async_trait::async_trait]
pub trait EventService {
    /// Registers a new connection and hands back the receiving end of its outbound queue.
    async fn connect(&self) -> (ConnectionId, mpsc::Receiver<Event>);

    async fn join(&self, user_id: user::Id, conn: ConnectionId);

    async fn join_room(&self, chat_id: chat::Id, conn: ConnectionId);

    async fn leave_room(&self, chat_id: &chat::Id, conn: &ConnectionId);

    async fn disconnect(&self, conn: &ConnectionId);

    async fn is_online(&self, user_id: &user::Id) -> bool;

    /// Fire-and-forget delivery to every connection in the chat's room.
    async fn broadcast_to_room(&self, chat_id: &chat::Id, event: Event);

    /// Fire-and-forget delivery to every live connection.
    async fn broadcast_to_all(&self, event: Event);
}

#[derive(Clone)]
pub struct EventServiceImpl {
    registry: Arc<Mutex<Registry>>,
    buffer: usize,
}

impl EventServiceImpl {
    pub fn new(buffer: usize) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            buffer: buffer.max(1),
        }
    }
}

#[async_trait::async_trait]
impl EventService for EventServiceImpl {
    async fn connect(&self) -> (ConnectionId, mpsc::Receiver<Event>) {
        let conn = ConnectionId::random();
        let (tx, rx) = mpsc::channel(self.buffer);

        self.registry.lock().await.connect(conn, tx);
        debug!("connection {conn} registered");

        (conn, rx)
    }

    async fn join(&self, user_id: user::Id, conn: ConnectionId) {
        self.registry.lock().await.join(user_id, conn);
        debug!("user {user_id} joined on {conn}");
    }

    async fn join_room(&self, chat_id: chat::Id, conn: ConnectionId) {
        self.registry.lock().await.join_room(chat_id, conn);
        debug!("{conn} joined room {chat_id}");
    }

    async fn leave_room(&self, chat_id: &chat::Id, conn: &ConnectionId) {
        self.registry.lock().await.leave_room(chat_id, conn);
        debug!("{conn} left room {chat_id}");
    }

    async fn disconnect(&self, conn: &ConnectionId) {
        self.registry.lock().await.disconnect(conn);
        debug!("connection {conn} removed");
    }

    async fn is_online(&self, user_id: &user::Id) -> bool {
        self.registry
            .lock()
            .await
            .find_connection(user_id)
            .is_some()
    }

    async fn broadcast_to_room(&self, chat_id: &chat::Id, event: Event) {
        // Enqueued under the lock, so each connection sees room events in issue order.
        let registry = self.registry.lock().await;
        for outbox in registry.room(chat_id) {
            deliver(outbox, &event);
        }
    }

    async fn broadcast_to_all(&self, event: Event) {
        let registry = self.registry.lock().await;
        for outbox in registry.all() {
            deliver(outbox, &event);
        }
    }
}

fn deliver(outbox: &mpsc::Sender<Event>, event: &Event) {
    if let Err(e) = outbox.try_send(event.clone()) {
        match e {
            mpsc::error::TrySendError::Full(_) => warn!("Outbound queue is full, dropping event"),
            mpsc::error::TrySendError::Closed(_) => debug!("Outbound queue is closed, dropping event"),
        }
    }
}
