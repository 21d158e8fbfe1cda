use chrono::Utc;
use log::debug;

use crate::event::model::Event;
use crate::integration::db::Committed;
use crate::{chat, event, message, user};

use super::Repository;
use super::model::ReadReceipt;

#[async_trait::async_trait]
pub trait ReadService {
    async fn mark_read(
        &self,
        chat_id: &chat::Id,
        reader: &user::Id,
        ids: &[message::Id],
    ) -> super::Result<ReadReceipt>;

    /// Marks every message of others up to now as read.
    async fn mark_chat_read(&self, chat_id: &chat::Id, reader: &user::Id) -> super::Result<ReadReceipt>;

    async fn unread_count(&self, chat_id: &chat::Id, user_id: &user::Id) -> super::Result<i64>;
}

#[derive(Clone)]
pub struct ReadServiceImpl {
    repo: Repository,
    chat_service: chat::Service,
    event_service: event::Service,
}

impl ReadServiceImpl {
    pub fn new(repo: Repository, chat_service: chat::Service, event_service: event::Service) -> Self {
        Self {
            repo,
            chat_service,
            event_service,
        }
    }
}

#[async_trait::async_trait]
impl ReadService for ReadServiceImpl {
    async fn mark_read(
        &self,
        chat_id: &chat::Id,
        reader: &user::Id,
        ids: &[message::Id],
    ) -> super::Result<ReadReceipt> {
        if ids.is_empty() {
            return Err(super::Error::MissingField("message_ids"));
        }
        self.chat_service.check_member(chat_id, reader).await?;

        let receipt = self
            .repo
            .mark_read(chat_id, reader, ids, Utc::now().naive_utc())?;

        self.notify(&receipt).await;
        Ok(receipt.into_inner())
    }

    async fn mark_chat_read(&self, chat_id: &chat::Id, reader: &user::Id) -> super::Result<ReadReceipt> {
        self.chat_service.check_member(chat_id, reader).await?;

        let receipt = self
            .repo
            .mark_all_read(chat_id, reader, Utc::now().naive_utc())?;

        self.notify(&receipt).await;
        Ok(receipt.into_inner())
    }

    async fn unread_count(&self, chat_id: &chat::Id, user_id: &user::Id) -> super::Result<i64> {
        self.chat_service.check_member(chat_id, user_id).await?;

        self.repo.count_unread(chat_id, user_id)
    }
}

impl ReadServiceImpl {
    async fn notify(&self, receipt: &Committed<ReadReceipt>) {
        if !receipt.message_ids().is_empty() {
            self.event_service
                .broadcast_to_room(
                    receipt.chat_id(),
                    Event::MessageRead {
                        chat_id: *receipt.chat_id(),
                        user_id: *receipt.user_id(),
                        message_ids: receipt.message_ids().to_vec(),
                        timestamp: *receipt.read_at(),
                    },
                )
                .await;
        }

        // Badges live outside the open chat too, so everyone hears about it.
        self.event_service
            .broadcast_to_all(Event::UnreadCountUpdated {
                user_id: *receipt.user_id(),
                chat_id: *receipt.chat_id(),
            })
            .await;

        debug!(
            "user {} read {} message(s) in chat {}",
            receipt.user_id(),
            receipt.message_ids().len(),
            receipt.chat_id()
        );
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use chrono::Duration;

    use crate::chat::service::ChatServiceImpl;
    use crate::chat::repository::SqliteChatRepository;
    use crate::event::service::{EventService, EventServiceImpl};
    use crate::integration::db;
    use crate::message::model::NewMessage;
    use crate::message::repository::{MessageRepository, SqliteMessageRepository};
    use crate::read::repository::{ReadRepository, SqliteReadRepository};
    use crate::user::fixture;
    use crate::user::repository::SqliteUserRepository;

    use super::*;

    struct Scene {
        service: ReadServiceImpl,
        events: Arc<EventServiceImpl>,
        messages: SqliteMessageRepository,
        reads: SqliteReadRepository,
        chat_id: chat::Id,
        student: user::Id,
        teacher: user::Id,
        outsider: user::Id,
    }

    async fn scene() -> Scene {
        let pool = db::Config::memory().connect();
        let (student, teacher, outsider) = {
            let mut conn = pool.get().unwrap();
            (
                fixture::student(&mut conn, "jora", "IT-21"),
                fixture::teacher(&mut conn, "igor"),
                fixture::student(&mut conn, "radu", "EC-11"),
            )
        };
        let chat_service: chat::Service = Arc::new(ChatServiceImpl::new(
            Arc::new(SqliteChatRepository::new(pool.clone())),
            Arc::new(SqliteUserRepository::new(pool.clone())),
            Arc::new(SqliteMessageRepository::new(pool.clone())),
            Arc::new(SqliteReadRepository::new(pool.clone())),
        ));
        let chat_id = *chat_service
            .create_personal(&student, &teacher)
            .await
            .unwrap()
            .id();
        let events = Arc::new(EventServiceImpl::new(16));

        Scene {
            service: ReadServiceImpl::new(
                Arc::new(SqliteReadRepository::new(pool.clone())),
                chat_service,
                events.clone(),
            ),
            events,
            messages: SqliteMessageRepository::new(pool.clone()),
            reads: SqliteReadRepository::new(pool),
            chat_id,
            student,
            teacher,
            outsider,
        }
    }

    fn send(s: &Scene, sender: &user::Id, content: &str) -> message::Id {
        let at = Utc::now().naive_utc() - Duration::seconds(5);
        *s.messages
            .insert(&NewMessage::new(&s.chat_id, sender, content, None, at))
            .unwrap()
            .id()
    }

    #[tokio::test]
    async fn should_reject_empty_id_list() {
        let s = scene().await;

        let res = s.service.mark_read(&s.chat_id, &s.student, &[]).await;

        assert!(matches!(res, Err(crate::read::Error::MissingField("message_ids"))));
    }

    #[tokio::test]
    async fn should_reject_outsider() {
        let s = scene().await;
        let id = send(&s, &s.teacher, "hi");

        let res = s.service.mark_read(&s.chat_id, &s.outsider, &[id]).await;

        assert!(matches!(
            res,
            Err(crate::read::Error::_Chat(chat::Error::NotParticipant(_, _)))
        ));
        assert!(!s.messages.find_by_id(&id).unwrap().unwrap().is_read());
    }

    #[tokio::test]
    async fn should_emit_receipt_to_room_and_badge_update_to_all() {
        let s = scene().await;
        let id = send(&s, &s.teacher, "hi");
        let (in_room, mut in_room_rx) = s.events.connect().await;
        let (_elsewhere, mut elsewhere_rx) = s.events.connect().await;
        s.events.join_room(s.chat_id, in_room).await;

        let receipt = s.service.mark_read(&s.chat_id, &s.student, &[id]).await.unwrap();

        assert_eq!(
            in_room_rx.recv().await.unwrap(),
            Event::MessageRead {
                chat_id: s.chat_id,
                user_id: s.student,
                message_ids: vec![id],
                timestamp: *receipt.read_at(),
            }
        );
        let badge = Event::UnreadCountUpdated {
            user_id: s.student,
            chat_id: s.chat_id,
        };
        assert_eq!(in_room_rx.recv().await.unwrap(), badge);
        assert_eq!(elsewhere_rx.recv().await.unwrap(), badge);
    }

    #[tokio::test]
    async fn should_not_move_state_on_second_mark() {
        let s = scene().await;
        let id = send(&s, &s.teacher, "hi");

        let first = s.service.mark_read(&s.chat_id, &s.student, &[id]).await.unwrap();
        let second = s.service.mark_read(&s.chat_id, &s.student, &[id]).await.unwrap();

        assert!(second.read_at() >= first.read_at());
        assert_eq!(
            s.reads.find_watermark(&s.chat_id, &s.student).unwrap(),
            Some(*second.read_at())
        );
        assert_eq!(s.service.unread_count(&s.chat_id, &s.student).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn should_clear_unread_count_of_whole_chat() {
        let s = scene().await;
        for content in ["one", "two", "three"] {
            send(&s, &s.teacher, content);
        }
        assert_eq!(s.reads.find_watermark(&s.chat_id, &s.student).unwrap(), None);
        assert_eq!(s.service.unread_count(&s.chat_id, &s.student).await.unwrap(), 3);

        let receipt = s.service.mark_chat_read(&s.chat_id, &s.student).await.unwrap();

        assert_eq!(receipt.message_ids().len(), 3);
        assert_eq!(s.service.unread_count(&s.chat_id, &s.student).await.unwrap(), 0);
        assert_eq!(
            s.reads.find_watermark(&s.chat_id, &s.student).unwrap(),
            Some(*receipt.read_at())
        );
    }

    #[tokio::test]
    async fn should_only_refresh_badges_when_nothing_was_unread() {
        let s = scene().await;
        let (conn, mut rx) = s.events.connect().await;
        s.events.join_room(s.chat_id, conn).await;

        let receipt = s.service.mark_chat_read(&s.chat_id, &s.student).await.unwrap();

        assert!(receipt.message_ids().is_empty());
        assert!(matches!(
            rx.recv().await.unwrap(),
            Event::UnreadCountUpdated { .. }
        ));
        assert!(rx.try_recv().is_err());
    }
}
