use chrono::Utc;
use diesel::Connection;
use diesel::ExpressionMethods;
use diesel::OptionalExtension;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::SelectableHelper;
use diesel::SqliteConnection;

use crate::integration::db::Pool;
use crate::schema::{chat_participants, chats};
use crate::user;

use super::model::{Chat, Created, NewChat, NewParticipant, Participant};
use super::{Id, Kind};

pub trait ChatRepository {
    fn find_by_id(&self, id: &Id) -> super::Result<Chat>;

    /// Chats the user participates in, most recently active first.
    fn find_by_user(&self, user_id: &user::Id, kind: Option<Kind>) -> super::Result<Vec<Chat>>;

    fn create_personal(&self, a: &user::Id, b: &user::Id) -> super::Result<Created>;

    fn create_group(&self, subject: &str, members: &[user::Id]) -> super::Result<Id>;

    fn find_participants(&self, id: &Id) -> super::Result<Vec<Participant>>;

    fn find_participant(&self, id: &Id, user_id: &user::Id) -> super::Result<Option<Participant>>;
}

pub struct SqliteChatRepository {
    pool: Pool,
}

impl SqliteChatRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl ChatRepository for SqliteChatRepository {
    fn find_by_id(&self, id: &Id) -> super::Result<Chat> {
        let mut conn = self.pool.get()?;

        let chat = chats::table
            .find(id)
            .select(Chat::as_select())
            .first(&mut conn)
            .optional()?;

        chat.ok_or(super::Error::NotFound(*id))
    }

    fn find_by_user(&self, user_id: &user::Id, kind: Option<Kind>) -> super::Result<Vec<Chat>> {
        let mut conn = self.pool.get()?;

        let mut query = chats::table
            .inner_join(chat_participants::table)
            .filter(chat_participants::user_id.eq(user_id))
            .select(Chat::as_select())
            .order((chats::updated_at.desc(), chats::id.desc()))
            .into_boxed();

        if let Some(kind) = kind {
            query = query.filter(chats::kind.eq(kind));
        }

        let chats = query.load(&mut conn)?;
        Ok(chats)
    }

    fn create_personal(&self, a: &user::Id, b: &user::Id) -> super::Result<Created> {
        let mut conn = self.pool.get()?;

        // Immediate: the lookup and the insert must not interleave with a concurrent create.
        conn.immediate_transaction(|conn| {
            if let Some(id) = find_personal(conn, a, b)? {
                return Ok(Created::Existing(id));
            }

            let now = Utc::now().naive_utc();
            let id = diesel::insert_into(chats::table)
                .values(NewChat::new(Kind::Personal, None, now))
                .returning(chats::id)
                .get_result::<Id>(conn)?;

            diesel::insert_into(chat_participants::table)
                .values(vec![
                    NewParticipant::new(&id, a, now),
                    NewParticipant::new(&id, b, now),
                ])
                .execute(conn)?;

            Ok(Created::New(id))
        })
    }

    fn create_group(&self, subject: &str, members: &[user::Id]) -> super::Result<Id> {
        let mut conn = self.pool.get()?;

        conn.transaction(|conn| {
            let now = Utc::now().naive_utc();
            let id = diesel::insert_into(chats::table)
                .values(NewChat::new(Kind::Group, Some(subject), now))
                .returning(chats::id)
                .get_result::<Id>(conn)?;

            let participants = members
                .iter()
                .map(|m| NewParticipant::new(&id, m, now))
                .collect::<Vec<_>>();

            diesel::insert_into(chat_participants::table)
                .values(participants)
                .execute(conn)?;

            Ok(id)
        })
    }

    fn find_participants(&self, id: &Id) -> super::Result<Vec<Participant>> {
        let mut conn = self.pool.get()?;

        let participants = chat_participants::table
            .filter(chat_participants::chat_id.eq(id))
            .select(Participant::as_select())
            .order(chat_participants::id.asc())
            .load(&mut conn)?;

        Ok(participants)
    }

    fn find_participant(&self, id: &Id, user_id: &user::Id) -> super::Result<Option<Participant>> {
        let mut conn = self.pool.get()?;

        let participant = chat_participants::table
            .filter(chat_participants::chat_id.eq(id))
            .filter(chat_participants::user_id.eq(user_id))
            .select(Participant::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(participant)
    }
}

fn find_personal(
    conn: &mut SqliteConnection,
    a: &user::Id,
    b: &user::Id,
) -> diesel::QueryResult<Option<Id>> {
    let chats_of_a = chat_participants::table
        .inner_join(chats::table)
        .filter(chats::kind.eq(Kind::Personal))
        .filter(chat_participants::user_id.eq(*a))
        .select(chat_participants::chat_id)
        .load::<Id>(conn)?;

    if chats_of_a.is_empty() {
        return Ok(None);
    }

    chat_participants::table
        .filter(chat_participants::user_id.eq(*b))
        .filter(chat_participants::chat_id.eq_any(chats_of_a))
        .select(chat_participants::chat_id)
        .first::<Id>(conn)
        .optional()
}
