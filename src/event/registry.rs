use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use tokio::sync::mpsc;

use crate::{chat, user};

use super::model::{ConnectionId, Event};

/// Presence and room membership of every live connection.
///
/// Not synchronized on its own; the event service keeps it behind one mutex.
#[derive(Default)]
pub struct Registry {
    outboxes: HashMap<ConnectionId, mpsc::Sender<Event>>,
    presence: HashMap<user::Id, ConnectionId>,
    presence_by_conn: HashMap<ConnectionId, user::Id>,
    rooms: HashMap<chat::Id, HashSet<ConnectionId>>,
}

impl Registry {
    pub fn connect(&mut self, conn: ConnectionId, outbox: mpsc::Sender<Event>) {
        self.outboxes.insert(conn, outbox);
    }

    /// Last writer wins: a second connection of the same user supersedes the first.
    pub fn join(&mut self, user_id: user::Id, conn: ConnectionId) {
        if let Some(previous_user) = self.presence_by_conn.remove(&conn) {
            if self.presence.get(&previous_user) == Some(&conn) {
                self.presence.remove(&previous_user);
            }
        }

        if let Some(previous_conn) = self.presence.insert(user_id, conn) {
            if previous_conn != conn {
                debug!("user {user_id} moved from {previous_conn} to {conn}");
                self.presence_by_conn.remove(&previous_conn);
            }
        }

        self.presence_by_conn.insert(conn, user_id);
    }

    pub fn join_room(&mut self, chat_id: chat::Id, conn: ConnectionId) {
        self.rooms.entry(chat_id).or_default().insert(conn);
    }

    pub fn leave_room(&mut self, chat_id: &chat::Id, conn: &ConnectionId) {
        if let Some(members) = self.rooms.get_mut(chat_id) {
            members.remove(conn);
            if members.is_empty() {
                self.rooms.remove(chat_id);
            }
        }
    }

    /// Forgets the connection everywhere. Unknown connections are a no-op.
    pub fn disconnect(&mut self, conn: &ConnectionId) {
        if self.outboxes.remove(conn).is_none() {
            warn!("disconnect of unknown connection {conn}");
        }

        if let Some(user_id) = self.presence_by_conn.remove(conn) {
            if self.presence.get(&user_id) == Some(conn) {
                self.presence.remove(&user_id);
            }
        }

        self.rooms.retain(|_, members| {
            members.remove(conn);
            !members.is_empty()
        });
    }

    pub fn find_connection(&self, user_id: &user::Id) -> Option<&ConnectionId> {
        self.presence.get(user_id)
    }

    pub fn find_user(&self, conn: &ConnectionId) -> Option<&user::Id> {
        self.presence_by_conn.get(conn)
    }

    pub fn room(&self, chat_id: &chat::Id) -> impl Iterator<Item = &mpsc::Sender<Event>> {
        self.rooms
            .get(chat_id)
            .into_iter()
            .flatten()
            .filter_map(|conn| self.outboxes.get(conn))
    }

    pub fn all(&self) -> impl Iterator<Item = &mpsc::Sender<Event>> {
        self.outboxes.values()
    }

    pub fn room_size(&self, chat_id: &chat::Id) -> usize {
        self.rooms.get(chat_id).map_or(0, HashSet::len)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.outboxes.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn connected(registry: &mut Registry) -> (ConnectionId, mpsc::Receiver<Event>) {
        let conn = ConnectionId::random();
        let (tx, rx) = mpsc::channel(8);
        registry.connect(conn, tx);
        (conn, rx)
    }

    #[test]
    fn should_supersede_previous_connection_of_user() {
        let mut registry = Registry::default();
        let (first, _rx1) = connected(&mut registry);
        let (second, _rx2) = connected(&mut registry);

        registry.join(user::Id(7), first);
        registry.join(user::Id(7), second);

        assert_eq!(registry.find_connection(&user::Id(7)), Some(&second));
        assert_eq!(registry.find_user(&first), None);

        // The superseded connection going away must not evict the new one.
        registry.disconnect(&first);
        assert_eq!(registry.find_connection(&user::Id(7)), Some(&second));
    }

    #[test]
    fn should_rebind_connection_to_new_user() {
        let mut registry = Registry::default();
        let (conn, _rx) = connected(&mut registry);

        registry.join(user::Id(7), conn);
        registry.join(user::Id(9), conn);

        assert_eq!(registry.find_connection(&user::Id(7)), None);
        assert_eq!(registry.find_user(&conn), Some(&user::Id(9)));
    }

    #[test]
    fn should_keep_rooms_as_sets() {
        let mut registry = Registry::default();
        let (conn, _rx) = connected(&mut registry);

        registry.join_room(chat::Id(42), conn);
        registry.join_room(chat::Id(42), conn);

        assert_eq!(registry.room_size(&chat::Id(42)), 1);
        assert_eq!(registry.room(&chat::Id(42)).count(), 1);
    }

    #[test]
    fn should_drop_empty_room_on_leave() {
        let mut registry = Registry::default();
        let (conn, _rx) = connected(&mut registry);

        registry.join_room(chat::Id(42), conn);
        registry.leave_room(&chat::Id(42), &conn);
        registry.leave_room(&chat::Id(43), &conn);

        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn should_forget_connection_everywhere_on_disconnect() {
        let mut registry = Registry::default();
        let (conn, _rx) = connected(&mut registry);
        let (other, _rx_other) = connected(&mut registry);

        registry.join(user::Id(7), conn);
        registry.join_room(chat::Id(1), conn);
        registry.join_room(chat::Id(2), conn);
        registry.join_room(chat::Id(2), other);

        registry.disconnect(&conn);

        assert_eq!(registry.find_connection(&user::Id(7)), None);
        assert_eq!(registry.find_user(&conn), None);
        assert_eq!(registry.room_count(), 1);
        assert_eq!(registry.room_size(&chat::Id(2)), 1);
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn should_ignore_unknown_disconnect() {
        let mut registry = Registry::default();

        registry.disconnect(&ConnectionId::random());

        assert_eq!(registry.connection_count(), 0);
    }
}
