use chrono::NaiveDateTime;
use diesel::BoolExpressionMethods;
use diesel::Connection;
use diesel::ExpressionMethods;
use diesel::OptionalExtension;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::SqliteConnection;

use crate::integration::db::{Committed, Pool};
use crate::schema::{chat_participants, messages};
use crate::{chat, message, user};

use super::model::ReadReceipt;

pub trait ReadRepository {
    /// Flags the listed messages of `chat_id` not sent by `reader` as read and advances the
    /// reader's watermark to `at`, in one transaction.
    fn mark_read(
        &self,
        chat_id: &chat::Id,
        reader: &user::Id,
        ids: &[message::Id],
        at: NaiveDateTime,
    ) -> super::Result<Committed<ReadReceipt>>;

    /// Same as `mark_read` for every unread message created up to `at`.
    /// The receipt lists the messages that changed.
    fn mark_all_read(
        &self,
        chat_id: &chat::Id,
        reader: &user::Id,
        at: NaiveDateTime,
    ) -> super::Result<Committed<ReadReceipt>>;

    /// Unread messages of others, after the watermark when the user has one.
    fn count_unread(&self, chat_id: &chat::Id, user_id: &user::Id) -> super::Result<i64>;

    fn find_watermark(
        &self,
        chat_id: &chat::Id,
        user_id: &user::Id,
    ) -> super::Result<Option<NaiveDateTime>>;
}

pub struct SqliteReadRepository {
    pool: Pool,
}

impl SqliteReadRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl ReadRepository for SqliteReadRepository {
    fn mark_read(
        &self,
        chat_id: &chat::Id,
        reader: &user::Id,
        ids: &[message::Id],
        at: NaiveDateTime,
    ) -> super::Result<Committed<ReadReceipt>> {
        let mut conn = self.pool.get()?;

        conn.transaction(|conn| {
            diesel::update(
                messages::table
                    .filter(messages::chat_id.eq(chat_id))
                    .filter(messages::id.eq_any(ids))
                    .filter(messages::sender_id.ne(reader))
                    .filter(messages::is_read.eq(false)),
            )
            .set(messages::is_read.eq(true))
            .execute(conn)?;

            advance_watermark(conn, chat_id, reader, at)
        })?;

        Ok(Committed::new(ReadReceipt::new(
            *chat_id,
            *reader,
            ids.to_vec(),
            at,
        )))
    }

    fn mark_all_read(
        &self,
        chat_id: &chat::Id,
        reader: &user::Id,
        at: NaiveDateTime,
    ) -> super::Result<Committed<ReadReceipt>> {
        let mut conn = self.pool.get()?;

        let ids = conn.transaction(|conn| {
            let ids = messages::table
                .filter(messages::chat_id.eq(chat_id))
                .filter(messages::sender_id.ne(reader))
                .filter(messages::is_read.eq(false))
                .filter(messages::created_at.le(at))
                .select(messages::id)
                .order(messages::id.asc())
                .load::<message::Id>(conn)?;

            diesel::update(messages::table.filter(messages::id.eq_any(&ids)))
                .set(messages::is_read.eq(true))
                .execute(conn)?;

            advance_watermark(conn, chat_id, reader, at)?;
            diesel::QueryResult::Ok(ids)
        })?;

        Ok(Committed::new(ReadReceipt::new(*chat_id, *reader, ids, at)))
    }

    fn count_unread(&self, chat_id: &chat::Id, user_id: &user::Id) -> super::Result<i64> {
        let mut conn = self.pool.get()?;

        let watermark = find_watermark(&mut conn, chat_id, user_id)?;

        let mut query = messages::table
            .filter(messages::chat_id.eq(chat_id))
            .filter(messages::is_read.eq(false))
            .filter(messages::sender_id.ne(user_id))
            .count()
            .into_boxed();

        if let Some(watermark) = watermark {
            query = query.filter(messages::created_at.gt(watermark));
        }

        let count = query.get_result::<i64>(&mut conn)?;
        Ok(count)
    }

    fn find_watermark(
        &self,
        chat_id: &chat::Id,
        user_id: &user::Id,
    ) -> super::Result<Option<NaiveDateTime>> {
        let mut conn = self.pool.get()?;

        let watermark = find_watermark(&mut conn, chat_id, user_id)?;
        Ok(watermark)
    }
}

fn find_watermark(
    conn: &mut SqliteConnection,
    chat_id: &chat::Id,
    user_id: &user::Id,
) -> diesel::QueryResult<Option<NaiveDateTime>> {
    let watermark = chat_participants::table
        .filter(chat_participants::chat_id.eq(chat_id))
        .filter(chat_participants::user_id.eq(user_id))
        .select(chat_participants::last_read_at)
        .first::<Option<NaiveDateTime>>(conn)
        .optional()?;

    Ok(watermark.flatten())
}

/// Never moves the watermark backwards.
fn advance_watermark(
    conn: &mut SqliteConnection,
    chat_id: &chat::Id,
    user_id: &user::Id,
    at: NaiveDateTime,
) -> diesel::QueryResult<()> {
    diesel::update(
        chat_participants::table
            .filter(chat_participants::chat_id.eq(chat_id))
            .filter(chat_participants::user_id.eq(user_id))
            .filter(
                chat_participants::last_read_at
                    .is_null()
                    .or(chat_participants::last_read_at.lt(at)),
            ),
    )
    .set(chat_participants::last_read_at.eq(Some(at)))
    .execute(conn)?;

    Ok(())
}
