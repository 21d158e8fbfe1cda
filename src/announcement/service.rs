use chrono::Utc;
use log::{error, info};

use crate::integration::db::Committed;
use crate::notification::Category;
use crate::notification::model::Dispatch;
use crate::{notification, user};

use super::model::{Announcement, Audience, Draft, NewAnnouncement};
use super::{Id, Repository};

#[async_trait::async_trait]
pub trait AnnouncementService {
    /// Resolves the audience, stores the announcement and notifies every recipient.
    /// A missing individual recipient fails before anything is stored.
    async fn create(&self, draft: Draft) -> super::Result<Announcement>;

    async fn resolve(&self, audience: &Audience) -> super::Result<Vec<user::Id>>;

    async fn notify(&self, announcement: &Committed<Announcement>, recipients: Vec<user::Id>);

    async fn find_one(&self, id: &Id) -> super::Result<Announcement>;

    async fn find_for_user(&self, user_id: &user::Id) -> super::Result<Vec<Announcement>>;
}

#[derive(Clone)]
pub struct AnnouncementServiceImpl {
    repo: Repository,
    user_repo: user::Repository,
    notification_service: notification::Service,
}

impl AnnouncementServiceImpl {
    pub fn new(
        repo: Repository,
        user_repo: user::Repository,
        notification_service: notification::Service,
    ) -> Self {
        Self {
            repo,
            user_repo,
            notification_service,
        }
    }
}

#[async_trait::async_trait]
impl AnnouncementService for AnnouncementServiceImpl {
    async fn create(&self, draft: Draft) -> super::Result<Announcement> {
        if !self.user_repo.exists(draft.teacher_id())? {
            return Err(user::Error::NotFound(*draft.teacher_id()).into());
        }

        let recipients = self.resolve(draft.audience()).await?;

        let announcement = self
            .repo
            .insert(&NewAnnouncement::new(&draft, Utc::now().naive_utc()))?;
        info!(
            "announcement {} created for {} recipient(s)",
            announcement.id(),
            recipients.len()
        );

        self.notify(&announcement, recipients).await;
        Ok(announcement.into_inner())
    }

    async fn resolve(&self, audience: &Audience) -> super::Result<Vec<user::Id>> {
        let recipients = match audience {
            Audience::All => self.user_repo.find_all_ids()?,
            Audience::Group(group) => self
                .user_repo
                .find_students_by_group(group)?
                .iter()
                .map(|s| *s.user_id())
                .collect(),
            Audience::Individual(id) => {
                if !self.user_repo.exists(id)? {
                    return Err(user::Error::NotFound(*id).into());
                }
                vec![*id]
            }
        };

        Ok(recipients)
    }

    async fn notify(&self, announcement: &Committed<Announcement>, recipients: Vec<user::Id>) {
        let summary = announcement.summary();
        let dispatch = Dispatch::new(recipients, Category::Message, "New announcement", summary)
            .reference(announcement.id().0);

        if let Err(e) = self.notification_service.dispatch(dispatch).await {
            error!(
                "Failed to dispatch notifications of announcement {}: {e}",
                announcement.id()
            );
        }
    }

    async fn find_one(&self, id: &Id) -> super::Result<Announcement> {
        self.repo.find_by_id(id)?.ok_or(super::Error::NotFound(*id))
    }

    async fn find_for_user(&self, user_id: &user::Id) -> super::Result<Vec<Announcement>> {
        if !self.user_repo.exists(user_id)? {
            return Err(user::Error::NotFound(*user_id).into());
        }

        let group = self
            .user_repo
            .find_student(user_id)?
            .map(|s| s.group_name().to_string());

        self.repo.find_visible(user_id, group.as_deref())
    }
}
