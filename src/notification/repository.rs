use chrono::Utc;
use diesel::Connection;
use diesel::ExpressionMethods;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::SelectableHelper;

use crate::integration::db::{Committed, Pool};
use crate::page;
use crate::schema::{notifications, push_tokens};
use crate::user;

use super::model::{NewNotification, Notification};
use super::{Category, Id};

pub trait NotificationRepository {
    /// All records of one dispatch commit together.
    fn insert_all(&self, notifications: &[NewNotification]) -> super::Result<Committed<Vec<Id>>>;

    fn find_page(
        &self,
        user_id: &user::Id,
        category: Option<Category>,
        params: &page::Params,
    ) -> super::Result<(Vec<Notification>, i64)>;

    fn mark_read(&self, user_id: &user::Id, ids: &[Id]) -> super::Result<usize>;

    /// Removes every token the user had and stores `token` as the only one.
    fn replace_push_token(&self, user_id: &user::Id, token: &str) -> super::Result<()>;

    fn find_push_tokens(&self, user_id: &user::Id) -> super::Result<Vec<String>>;
}

pub struct SqliteNotificationRepository {
    pool: Pool,
}

impl SqliteNotificationRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl NotificationRepository for SqliteNotificationRepository {
    fn insert_all(&self, records: &[NewNotification]) -> super::Result<Committed<Vec<Id>>> {
        let mut conn = self.pool.get()?;

        let ids = conn.transaction(|conn| {
            records
                .iter()
                .map(|n| {
                    diesel::insert_into(notifications::table)
                        .values(n)
                        .returning(notifications::id)
                        .get_result::<Id>(conn)
                })
                .collect::<diesel::QueryResult<Vec<_>>>()
        })?;

        Ok(Committed::new(ids))
    }

    fn find_page(
        &self,
        user_id: &user::Id,
        category: Option<Category>,
        params: &page::Params,
    ) -> super::Result<(Vec<Notification>, i64)> {
        let mut conn = self.pool.get()?;

        let mut count = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .count()
            .into_boxed();
        let mut query = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .limit(params.per_page())
            .offset(params.offset())
            .select(Notification::as_select())
            .into_boxed();

        if let Some(category) = category {
            count = count.filter(notifications::category.eq(category));
            query = query.filter(notifications::category.eq(category));
        }

        let total = count.get_result::<i64>(&mut conn)?;
        let notifications = query.load(&mut conn)?;

        Ok((notifications, total))
    }

    fn mark_read(&self, user_id: &user::Id, ids: &[Id]) -> super::Result<usize> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user_id))
                .filter(notifications::id.eq_any(ids)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)?;

        Ok(updated)
    }

    fn replace_push_token(&self, user_id: &user::Id, token: &str) -> super::Result<()> {
        let mut conn = self.pool.get()?;

        conn.transaction(|conn| {
            diesel::delete(push_tokens::table.filter(push_tokens::user_id.eq(user_id)))
                .execute(conn)?;

            diesel::insert_into(push_tokens::table)
                .values((
                    push_tokens::user_id.eq(user_id),
                    push_tokens::token.eq(token),
                    push_tokens::created_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;

            diesel::QueryResult::Ok(())
        })?;

        Ok(())
    }

    fn find_push_tokens(&self, user_id: &user::Id) -> super::Result<Vec<String>> {
        let mut conn = self.pool.get()?;

        let tokens = push_tokens::table
            .filter(push_tokens::user_id.eq(user_id))
            .select(push_tokens::token)
            .load::<String>(&mut conn)?;

        Ok(tokens)
    }
}
