use diesel::Connection;
use diesel::ExpressionMethods;
use diesel::OptionalExtension;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::SelectableHelper;

use crate::chat;
use crate::integration::db::{Committed, Pool};
use crate::page;
use crate::schema::{chats, messages};

use super::Id;
use super::model::{Message, NewMessage};

pub trait MessageRepository {
    /// Inserts the message and bumps the chat's `updated_at` in one transaction.
    fn insert(&self, message: &NewMessage) -> super::Result<Committed<Message>>;

    fn find_by_id(&self, id: &Id) -> super::Result<Option<Message>>;

    /// Newest first, with the total number of messages in the chat.
    fn find_page(
        &self,
        chat_id: &chat::Id,
        params: &page::Params,
    ) -> super::Result<(Vec<Message>, i64)>;

    fn find_last(&self, chat_id: &chat::Id) -> super::Result<Option<Message>>;
}

pub struct SqliteMessageRepository {
    pool: Pool,
}

impl SqliteMessageRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl MessageRepository for SqliteMessageRepository {
    fn insert(&self, message: &NewMessage) -> super::Result<Committed<Message>> {
        let mut conn = self.pool.get()?;

        let inserted = conn.transaction(|conn| {
            let inserted = diesel::insert_into(messages::table)
                .values(message)
                .returning(Message::as_returning())
                .get_result(conn)?;

            diesel::update(chats::table.find(message.chat_id()))
                .set(chats::updated_at.eq(message.created_at()))
                .execute(conn)?;

            diesel::QueryResult::Ok(inserted)
        })?;

        Ok(Committed::new(inserted))
    }

    fn find_by_id(&self, id: &Id) -> super::Result<Option<Message>> {
        let mut conn = self.pool.get()?;

        let message = messages::table
            .find(id)
            .select(Message::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(message)
    }

    fn find_page(
        &self,
        chat_id: &chat::Id,
        params: &page::Params,
    ) -> super::Result<(Vec<Message>, i64)> {
        let mut conn = self.pool.get()?;

        let total = messages::table
            .filter(messages::chat_id.eq(chat_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        let messages = messages::table
            .filter(messages::chat_id.eq(chat_id))
            .order((messages::created_at.desc(), messages::id.desc()))
            .limit(params.per_page())
            .offset(params.offset())
            .select(Message::as_select())
            .load(&mut conn)?;

        Ok((messages, total))
    }

    fn find_last(&self, chat_id: &chat::Id) -> super::Result<Option<Message>> {
        let mut conn = self.pool.get()?;

        let message = messages::table
            .filter(messages::chat_id.eq(chat_id))
            .order((messages::created_at.desc(), messages::id.desc()))
            .select(Message::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(message)
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};

    use crate::chat::repository::{ChatRepository, SqliteChatRepository};
    use crate::integration::db;
    use crate::user::fixture;

    use super::*;

    #[test]
    fn should_bump_chat_on_insert() {
        let pool = db::Config::memory().connect();
        let (jora, igor) = {
            let mut conn = pool.get().unwrap();
            (
                fixture::student(&mut conn, "jora", "IT-21"),
                fixture::teacher(&mut conn, "igor"),
            )
        };
        let chat_repo = SqliteChatRepository::new(pool.clone());
        let chat_id = *chat_repo.create_personal(&jora, &igor).unwrap().id();
        let repo = SqliteMessageRepository::new(pool);

        let later = Utc::now().naive_utc() + Duration::minutes(5);
        let message = repo
            .insert(&NewMessage::new(&chat_id, &jora, "hi", None, later))
            .unwrap();

        assert_eq!(message.content(), "hi");
        assert!(!message.is_read());
        assert_eq!(chat_repo.find_by_id(&chat_id).unwrap().updated_at(), &later);
        assert_eq!(repo.find_by_id(message.id()).unwrap().as_ref(), Some(&*message));
    }

    #[test]
    fn should_roll_back_when_chat_is_missing() {
        let pool = db::Config::memory().connect();
        let jora = fixture::student(&mut pool.get().unwrap(), "jora", "IT-21");
        let repo = SqliteMessageRepository::new(pool);

        let res = repo.insert(&NewMessage::new(
            &chat::Id(42),
            &jora,
            "hi",
            None,
            Utc::now().naive_utc(),
        ));

        assert!(res.is_err());
        assert!(repo.find_last(&chat::Id(42)).unwrap().is_none());
    }

    #[test]
    fn should_page_newest_first() {
        let pool = db::Config::memory().connect();
        let (jora, igor) = {
            let mut conn = pool.get().unwrap();
            (
                fixture::student(&mut conn, "jora", "IT-21"),
                fixture::teacher(&mut conn, "igor"),
            )
        };
        let chat_id = *SqliteChatRepository::new(pool.clone())
            .create_personal(&jora, &igor)
            .unwrap()
            .id();
        let repo = SqliteMessageRepository::new(pool);

        let start = Utc::now().naive_utc();
        for i in 0..5 {
            let content = format!("message {i}");
            repo.insert(&NewMessage::new(
                &chat_id,
                &jora,
                &content,
                None,
                start + Duration::seconds(i),
            ))
            .unwrap();
        }

        let (first, total) = repo.find_page(&chat_id, &page::Params::new(1, 2)).unwrap();
        let (last, _) = repo.find_page(&chat_id, &page::Params::new(3, 2)).unwrap();

        assert_eq!(total, 5);
        assert_eq!(first[0].content(), "message 4");
        assert_eq!(first[1].content(), "message 3");
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].content(), "message 0");
        assert_eq!(repo.find_last(&chat_id).unwrap().unwrap().content(), "message 4");
    }
}
