use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use log::{debug, error, warn};

use crate::{page, user};

use super::model::{Dispatch, DispatchReport, NewNotification, NotificationDto, PushMessage};
use super::push::{self, is_valid_token};
use super::{Category, Id, PushClient, Repository};

#[async_trait::async_trait]
pub trait NotificationService {
    /// Persists one notification per recipient, then pushes to every destination they have.
    ///
    /// Only a failed store transaction is an error. Push failures are logged and counted.
    async fn dispatch(&self, dispatch: Dispatch) -> super::Result<DispatchReport>;

    async fn register_push_token(&self, user_id: &user::Id, token: &str) -> super::Result<()>;

    async fn find_page(
        &self,
        user_id: &user::Id,
        category: Option<Category>,
        params: &page::Params,
    ) -> super::Result<page::Page<NotificationDto>>;

    async fn mark_read(&self, user_id: &user::Id, ids: &[Id]) -> super::Result<usize>;

    async fn send_test(&self, user_id: &user::Id) -> super::Result<DispatchReport>;
}

#[derive(Clone)]
pub struct NotificationServiceImpl {
    repo: Repository,
    user_repo: user::Repository,
    push: PushClient,
    push_timeout: Duration,
}

impl NotificationServiceImpl {
    pub fn new(
        repo: Repository,
        user_repo: user::Repository,
        push: PushClient,
        push_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            user_repo,
            push,
            push_timeout,
        }
    }
}

#[async_trait::async_trait]
impl NotificationService for NotificationServiceImpl {
    async fn dispatch(&self, dispatch: Dispatch) -> super::Result<DispatchReport> {
        if dispatch.recipients().is_empty() {
            return Ok(DispatchReport::default());
        }

        let payload = dispatch
            .payload_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let now = Utc::now().naive_utc();
        let records = dispatch
            .recipients()
            .iter()
            .map(|user_id| NewNotification::new(user_id, &dispatch, payload.as_deref(), now))
            .collect::<Vec<_>>();

        let persisted = self.repo.insert_all(&records)?;
        let mut report = DispatchReport {
            persisted: persisted.len(),
            ..Default::default()
        };

        let mut destinations = Vec::new();
        for user_id in dispatch.recipients() {
            match self.repo.find_push_tokens(user_id) {
                Ok(tokens) => destinations.extend(tokens.into_iter().map(|t| (*user_id, t))),
                Err(e) => {
                    error!("Failed to load push destinations of user {user_id}: {e}");
                    report.failed += 1;
                }
            }
        }

        let results = join_all(destinations.iter().map(|(user_id, token)| {
            let message = dispatch.push_message(token);
            async move { (user_id, self.deliver(&message).await) }
        }))
        .await;

        for (user_id, res) in results {
            match res {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Push delivery to user {user_id} failed: {e}");
                    report.failed += 1;
                }
            }
        }

        debug!("Dispatched {:?} notification: {report:?}", dispatch.category());
        Ok(report)
    }

    async fn register_push_token(&self, user_id: &user::Id, token: &str) -> super::Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(super::Error::MissingField("token"));
        }
        if !is_valid_token(token) {
            return Err(super::Error::InvalidToken(token.to_string()));
        }
        if !self.user_repo.exists(user_id)? {
            return Err(user::Error::NotFound(*user_id).into());
        }

        self.repo.replace_push_token(user_id, token)?;

        let welcome = PushMessage::new(
            token,
            "Notifications enabled",
            "You will now receive notifications on this device",
        );
        if let Err(e) = self.deliver(&welcome).await {
            warn!("Welcome push to user {user_id} failed: {e}");
        }

        Ok(())
    }

    async fn find_page(
        &self,
        user_id: &user::Id,
        category: Option<Category>,
        params: &page::Params,
    ) -> super::Result<page::Page<NotificationDto>> {
        let (notifications, total) = self.repo.find_page(user_id, category, params)?;

        let page = page::Page::new(notifications, total, params).map(NotificationDto::from);
        Ok(page)
    }

    async fn mark_read(&self, user_id: &user::Id, ids: &[Id]) -> super::Result<usize> {
        if ids.is_empty() {
            return Err(super::Error::MissingField("notification_ids"));
        }

        self.repo.mark_read(user_id, ids)
    }

    async fn send_test(&self, user_id: &user::Id) -> super::Result<DispatchReport> {
        if self.repo.find_push_tokens(user_id)?.is_empty() {
            return Err(super::Error::NoDestination(*user_id));
        }

        self.dispatch(Dispatch::new(
            vec![*user_id],
            Category::System,
            "Test notification",
            "Push notifications are working",
        ))
        .await
    }
}

impl NotificationServiceImpl {
    async fn deliver(&self, message: &PushMessage) -> push::Result<()> {
        match tokio::time::timeout(self.push_timeout, self.push.send(message)).await {
            Ok(res) => res,
            Err(_) => Err(push::Error::Timeout),
        }
    }
}
