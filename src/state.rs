use std::sync::Arc;

use axum::extract::FromRef;

use crate::announcement::repository::SqliteAnnouncementRepository;
use crate::announcement::service::AnnouncementServiceImpl;
use crate::auth::service::AuthServiceImpl;
use crate::chat::repository::SqliteChatRepository;
use crate::chat::service::ChatServiceImpl;
use crate::event::service::EventServiceImpl;
use crate::integration::{self, db};
use crate::message::repository::SqliteMessageRepository;
use crate::message::service::MessageServiceImpl;
use crate::notification::push::ExpoPushClient;
use crate::notification::repository::SqliteNotificationRepository;
use crate::notification::service::NotificationServiceImpl;
use crate::read::repository::SqliteReadRepository;
use crate::read::service::ReadServiceImpl;
use crate::user::repository::SqliteUserRepository;
use crate::{announcement, auth, chat, event, message, notification, read, user};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: auth::Service,
    pub event_service: event::Service,
    pub chat_service: chat::Service,
    pub message_service: message::Service,
    pub read_service: read::Service,
    pub notification_service: notification::Service,
    pub announcement_service: announcement::Service,
}

impl AppState {
    pub fn init(config: &integration::Config, pool: db::Pool) -> Self {
        let user_repo: user::Repository = Arc::new(SqliteUserRepository::new(pool.clone()));
        let chat_repo: chat::Repository = Arc::new(SqliteChatRepository::new(pool.clone()));
        let message_repo: message::Repository = Arc::new(SqliteMessageRepository::new(pool.clone()));
        let read_repo: read::Repository = Arc::new(SqliteReadRepository::new(pool.clone()));
        let notification_repo: notification::Repository =
            Arc::new(SqliteNotificationRepository::new(pool.clone()));
        let announcement_repo: announcement::Repository =
            Arc::new(SqliteAnnouncementRepository::new(pool));

        let auth_service = Arc::new(AuthServiceImpl::new(config.join_secret.as_deref()));
        let event_service: event::Service = Arc::new(EventServiceImpl::new(config.ws_buffer));

        let chat_service: chat::Service = Arc::new(ChatServiceImpl::new(
            chat_repo,
            user_repo.clone(),
            message_repo.clone(),
            read_repo.clone(),
        ));

        let push = Arc::new(ExpoPushClient::new(&config.push));
        let notification_service: notification::Service = Arc::new(NotificationServiceImpl::new(
            notification_repo,
            user_repo.clone(),
            push,
            config.push.timeout(),
        ));

        let message_service = Arc::new(MessageServiceImpl::new(
            message_repo,
            user_repo.clone(),
            chat_service.clone(),
            event_service.clone(),
            notification_service.clone(),
        ));

        let read_service = Arc::new(ReadServiceImpl::new(
            read_repo,
            chat_service.clone(),
            event_service.clone(),
        ));

        let announcement_service = Arc::new(AnnouncementServiceImpl::new(
            announcement_repo,
            user_repo,
            notification_service.clone(),
        ));

        Self {
            auth_service,
            event_service,
            chat_service,
            message_service,
            read_service,
            notification_service,
            announcement_service,
        }
    }
}
