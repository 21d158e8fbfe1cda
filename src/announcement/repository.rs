use diesel::BoolExpressionMethods;
use diesel::ExpressionMethods;
use diesel::OptionalExtension;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::SelectableHelper;

use crate::integration::db::{Committed, Pool};
use crate::schema::announcements;
use crate::user;

use super::model::{Announcement, NewAnnouncement};
use super::{Id, RecipientType};

pub trait AnnouncementRepository {
    fn insert(&self, announcement: &NewAnnouncement) -> super::Result<Committed<Announcement>>;

    fn find_by_id(&self, id: &Id) -> super::Result<Option<Announcement>>;

    /// Addressed to everyone, to `group`, to the user directly, or authored by the user.
    /// Pinned first, newest first.
    fn find_visible(
        &self,
        user_id: &user::Id,
        group: Option<&str>,
    ) -> super::Result<Vec<Announcement>>;
}

pub struct SqliteAnnouncementRepository {
    pool: Pool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl AnnouncementRepository for SqliteAnnouncementRepository {
    fn insert(&self, announcement: &NewAnnouncement) -> super::Result<Committed<Announcement>> {
        let mut conn = self.pool.get()?;

        let inserted = diesel::insert_into(announcements::table)
            .values(announcement)
            .returning(Announcement::as_returning())
            .get_result(&mut conn)?;

        Ok(Committed::new(inserted))
    }

    fn find_by_id(&self, id: &Id) -> super::Result<Option<Announcement>> {
        let mut conn = self.pool.get()?;

        let announcement = announcements::table
            .find(id)
            .select(Announcement::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(announcement)
    }

    fn find_visible(
        &self,
        user_id: &user::Id,
        group: Option<&str>,
    ) -> super::Result<Vec<Announcement>> {
        let mut conn = self.pool.get()?;

        let mut query = announcements::table
            .filter(announcements::recipient_type.eq(RecipientType::All))
            .or_filter(announcements::teacher_id.eq(user_id))
            .or_filter(
                announcements::recipient_type
                    .eq(RecipientType::Individual)
                    .and(announcements::recipient_id.eq(user_id.to_string())),
            )
            .into_boxed();

        if let Some(group) = group {
            query = query.or_filter(
                announcements::recipient_type
                    .eq(RecipientType::Group)
                    .and(announcements::recipient_id.eq(group)),
            );
        }

        let announcements = query
            .order((
                announcements::is_pinned.desc(),
                announcements::created_at.desc(),
                announcements::id.desc(),
            ))
            .select(Announcement::as_select())
            .load(&mut conn)?;

        Ok(announcements)
    }
}
