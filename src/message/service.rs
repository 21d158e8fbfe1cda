use chrono::Utc;
use log::{debug, error};
use serde_json::json;

use crate::event::model::Event;
use crate::integration::db::Committed;
use crate::notification::Category;
use crate::notification::model::Dispatch;
use crate::{chat, event, notification, page, user};

use super::model::{Message, MessageDto, NewMessage};
use super::{Id, Repository};

#[async_trait::async_trait]
pub trait MessageService {
    /// Validates and persists a message. Nothing is broadcast here.
    async fn commit(
        &self,
        chat_id: &chat::Id,
        sender: &user::Id,
        content: &str,
        reply_to: Option<&Id>,
    ) -> super::Result<Committed<Message>>;

    /// Fans a committed message out to the room and to the other participants.
    async fn notify(&self, message: &Committed<Message>);

    async fn send(
        &self,
        chat_id: &chat::Id,
        sender: &user::Id,
        content: &str,
        reply_to: Option<&Id>,
    ) -> super::Result<MessageDto>;

    async fn find_page(
        &self,
        chat_id: &chat::Id,
        params: &page::Params,
    ) -> super::Result<page::Page<MessageDto>>;
}

#[derive(Clone)]
pub struct MessageServiceImpl {
    repo: Repository,
    user_repo: user::Repository,
    chat_service: chat::Service,
    event_service: event::Service,
    notification_service: notification::Service,
}

impl MessageServiceImpl {
    pub fn new(
        repo: Repository,
        user_repo: user::Repository,
        chat_service: chat::Service,
        event_service: event::Service,
        notification_service: notification::Service,
    ) -> Self {
        Self {
            repo,
            user_repo,
            chat_service,
            event_service,
            notification_service,
        }
    }
}

#[async_trait::async_trait]
impl MessageService for MessageServiceImpl {
    async fn commit(
        &self,
        chat_id: &chat::Id,
        sender: &user::Id,
        content: &str,
        reply_to: Option<&Id>,
    ) -> super::Result<Committed<Message>> {
        let content = content.trim();
        if content.is_empty() {
            return Err(super::Error::EmptyContent);
        }

        self.chat_service.check_member(chat_id, sender).await?;

        if let Some(reply_to) = reply_to {
            let replied = self
                .repo
                .find_by_id(reply_to)?
                .ok_or(super::Error::NotFound(*reply_to))?;
            if replied.chat_id() != chat_id {
                return Err(super::Error::ForeignReply(*reply_to));
            }
        }

        let message = self.repo.insert(&NewMessage::new(
            chat_id,
            sender,
            content,
            reply_to,
            Utc::now().naive_utc(),
        ))?;

        debug!("message {} committed to chat {chat_id}", message.id());
        Ok(message)
    }

    async fn notify(&self, message: &Committed<Message>) {
        self.event_service
            .broadcast_to_room(
                message.chat_id(),
                Event::NewMessage {
                    chat_id: *message.chat_id(),
                    message: MessageDto::from((**message).clone()),
                },
            )
            .await;

        let recipients = match self.chat_service.find_members(message.chat_id()).await {
            Ok(members) => members
                .into_iter()
                .filter(|id| id != message.sender_id())
                .collect::<Vec<_>>(),
            Err(e) => {
                error!("Failed to resolve recipients of message {}: {e}", message.id());
                return;
            }
        };

        let sender_name = match self.user_repo.find_display_name(message.sender_id()) {
            Ok(Some(name)) => name,
            Ok(None) => "Unknown".to_string(),
            Err(e) => {
                error!("Failed to load sender of message {}: {e}", message.id());
                "Unknown".to_string()
            }
        };
        let preview = super::preview(message.content());

        let dispatch = Dispatch::new(
            recipients,
            Category::Message,
            "New message",
            format!("Message from {sender_name}: {preview}"),
        )
        .reference(message.id().0)
        .payload(json!({
            "chat_id": message.chat_id(),
            "sender_name": sender_name,
            "message_preview": preview,
        }))
        .push(format!("New message from {sender_name}"), preview);

        if let Err(e) = self.notification_service.dispatch(dispatch).await {
            error!("Failed to dispatch notifications of message {}: {e}", message.id());
        }
    }

    async fn send(
        &self,
        chat_id: &chat::Id,
        sender: &user::Id,
        content: &str,
        reply_to: Option<&Id>,
    ) -> super::Result<MessageDto> {
        let message = self.commit(chat_id, sender, content, reply_to).await?;
        self.notify(&message).await;

        Ok(message.into_inner().into())
    }

    async fn find_page(
        &self,
        chat_id: &chat::Id,
        params: &page::Params,
    ) -> super::Result<page::Page<MessageDto>> {
        let _ = self.chat_service.find_by_id(chat_id).await?;

        let (messages, total) = self.repo.find_page(chat_id, params)?;
        Ok(page::Page::new(messages, total, params).map(MessageDto::from))
    }
}
