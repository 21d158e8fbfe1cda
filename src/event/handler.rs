use axum::extract::ws::Message::{Binary, Close, Text};
use axum::extract::ws::{self, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, error, warn};
use tokio::sync::mpsc;
use tokio::try_join;

use crate::{auth, chat, event, read};

use super::context;
use super::model::{Command, Event};

#[derive(Clone)]
struct Services {
    event: event::Service,
    chat: chat::Service,
    read: read::Service,
    auth: auth::Service,
}

pub async fn ws(
    ws: WebSocketUpgrade,
    State(event_service): State<event::Service>,
    State(chat_service): State<chat::Service>,
    State(read_service): State<read::Service>,
    State(auth_service): State<auth::Service>,
) -> Response {
    let services = Services {
        event: event_service,
        chat: chat_service,
        read: read_service,
        auth: auth_service,
    };

    ws.on_upgrade(move |socket| handle_socket(socket, services))
}

async fn handle_socket(ws: WebSocket, services: Services) {
    let (conn, outbox) = services.event.connect().await;
    let ctx = context::Ws::new(conn);

    let (sender, receiver) = ws.split();

    let read_task = tokio::spawn(read(ctx.clone(), receiver, services.clone()));
    let write_task = tokio::spawn(write(ctx.clone(), sender, outbox));

    match try_join!(read_task, write_task) {
        Ok(_) => debug!("WS {conn} disconnected gracefully"),
        Err(e) => error!("WS {conn} disconnected with error: {e}"),
    }

    on_close(&ctx, &services).await;
}

/// Drops the connection from presence and from every room.
async fn on_close(ctx: &context::Ws, services: &Services) {
    services.event.disconnect(&ctx.id).await;
}

async fn read(ctx: context::Ws, mut receiver: SplitStream<WebSocket>, services: Services) {
    loop {
        tokio::select! {
            // close is notified => stop 'read' task
            _ = ctx.close.notified() => break,

            frame = receiver.next() => {
                match frame {
                    None => {
                        ctx.close.notify_one();
                        break;
                    }
                    Some(Err(e)) => {
                        error!("Failed to read WS frame: {e}");
                        ctx.close.notify_one(); // notify 'write' task to stop
                        break;
                    }
                    Some(Ok(Close(frame))) => {
                        debug!("WS connection closed by client: {frame:?}");
                        ctx.close.notify_one(); // notify 'write' task to stop
                        break;
                    }
                    Some(Ok(Text(content))) => {
                        if let Err(e) = handle_text_frame(&ctx, content.as_str(), &services).await {
                            warn!("Failed to handle command on {}: {e}", ctx.id);
                        }
                    }
                    Some(Ok(Binary(content))) => {
                        warn!("Received binary WS frame: {content:?}");
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

async fn handle_text_frame(
    ctx: &context::Ws,
    content: &str,
    services: &Services,
) -> super::Result<()> {
    match serde_json::from_str::<Command>(content) {
        Ok(command) => handle_command(ctx, command, services).await,
        Err(e) => {
            warn!("Skipping text frame, content is malformed: {e}");
            Ok(())
        }
    }
}

async fn handle_command(
    ctx: &context::Ws,
    command: Command,
    services: &Services,
) -> super::Result<()> {
    match command {
        Command::Join { user_id, token } => {
            services.auth.verify_join(&user_id, token.as_deref())?;
            ctx.set_user_id(user_id).await;
            services.event.join(user_id, ctx.id).await;
        }
        Command::JoinChat { chat_id } => {
            let user_id = ctx.get_user_id().await?;
            services.chat.check_member(&chat_id, &user_id).await?;
            services.event.join_room(chat_id, ctx.id).await;
        }
        Command::LeaveChat { chat_id } => {
            services.event.leave_room(&chat_id, &ctx.id).await;
        }
        Command::MarkMessagesRead {
            chat_id,
            user_id,
            message_ids,
        } => {
            let joined_as = ctx.get_user_id().await?;
            if joined_as != user_id {
                return Err(super::Error::IdentityMismatch(joined_as, user_id));
            }
            services
                .read
                .mark_read(&chat_id, &user_id, &message_ids)
                .await?;
        }
    }

    Ok(())
}

async fn write(
    ctx: context::Ws,
    mut sender: SplitSink<WebSocket, ws::Message>,
    mut outbox: mpsc::Receiver<Event>,
) {
    loop {
        tokio::select! {
            // close is notified => stop 'write' task
            _ = ctx.close.notified() => break,

            item = outbox.recv() => {
                let Some(event) = item else {
                    break;
                };

                let frame = match serde_json::to_string(&event) {
                    Ok(frame) => frame,
                    Err(e) => {
                        error!("Failed to serialize event: {e}");
                        continue;
                    }
                };

                if let Err(e) = sender.send(Text(frame.into())).await {
                    error!("Failed to send event to {}: {e}", ctx.id);
                    ctx.close.notify_one(); // notify 'read' task to stop
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use crate::auth::service::AuthServiceImpl;
    use crate::chat::repository::SqliteChatRepository;
    use crate::chat::service::ChatServiceImpl;
    use crate::event::service::EventServiceImpl;
    use crate::integration::db;
    use crate::message::model::NewMessage;
    use crate::message::repository::{MessageRepository, SqliteMessageRepository};
    use crate::read::repository::{ReadRepository, SqliteReadRepository};
    use crate::read::service::ReadServiceImpl;
    use crate::user::fixture;
    use crate::user::repository::SqliteUserRepository;
    use crate::{message, user};

    use super::*;

    struct Scene {
        services: Services,
        reads: SqliteReadRepository,
        ctx: context::Ws,
        outbox: mpsc::Receiver<Event>,
        chat_id: chat::Id,
        student: user::Id,
        teacher: user::Id,
        message_id: message::Id,
    }

    async fn scene() -> Scene {
        let pool = db::Config::memory().connect();
        let (student, teacher) = {
            let mut conn = pool.get().unwrap();
            (
                fixture::student(&mut conn, "jora", "IT-21"),
                fixture::teacher(&mut conn, "igor"),
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
        let message_id = *SqliteMessageRepository::new(pool.clone())
            .insert(&NewMessage::new(
                &chat_id,
                &teacher,
                "hi",
                None,
                Utc::now().naive_utc() - Duration::seconds(5),
            ))
            .unwrap()
            .id();

        let event_service: event::Service = Arc::new(EventServiceImpl::new(16));
        let (conn, outbox) = event_service.connect().await;
        let read_service: read::Service = Arc::new(ReadServiceImpl::new(
            Arc::new(SqliteReadRepository::new(pool.clone())),
            chat_service.clone(),
            event_service.clone(),
        ));

        Scene {
            services: Services {
                event: event_service,
                chat: chat_service,
                read: read_service,
                auth: Arc::new(AuthServiceImpl::new(None)),
            },
            reads: SqliteReadRepository::new(pool),
            ctx: context::Ws::new(conn),
            outbox,
            chat_id,
            student,
            teacher,
            message_id,
        }
    }

    fn unread(s: &Scene) -> Event {
        Event::UnreadCountUpdated {
            user_id: s.teacher,
            chat_id: s.chat_id,
        }
    }

    #[tokio::test]
    async fn should_put_joined_connection_into_room() {
        let mut s = scene().await;

        handle_text_frame(
            &s.ctx,
            &format!(r#"{{"type": "join", "user_id": {}}}"#, s.student),
            &s.services,
        )
        .await
        .unwrap();
        handle_command(&s.ctx, Command::JoinChat { chat_id: s.chat_id }, &s.services)
            .await
            .unwrap();

        assert!(s.services.event.is_online(&s.student).await);
        s.services.event.broadcast_to_room(&s.chat_id, unread(&s)).await;
        assert_eq!(s.outbox.try_recv().unwrap(), unread(&s));
    }

    #[tokio::test]
    async fn should_reject_join_chat_before_join() {
        let mut s = scene().await;

        let res =
            handle_command(&s.ctx, Command::JoinChat { chat_id: s.chat_id }, &s.services).await;

        assert!(matches!(res, Err(event::Error::NotJoined)));
        s.services.event.broadcast_to_room(&s.chat_id, unread(&s)).await;
        assert!(s.outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_reject_marking_as_someone_else() {
        let mut s = scene().await;
        handle_command(
            &s.ctx,
            Command::Join {
                user_id: s.teacher,
                token: None,
            },
            &s.services,
        )
        .await
        .unwrap();

        let res = handle_command(
            &s.ctx,
            Command::MarkMessagesRead {
                chat_id: s.chat_id,
                user_id: s.student,
                message_ids: vec![s.message_id],
            },
            &s.services,
        )
        .await;

        assert!(matches!(res, Err(event::Error::IdentityMismatch(_, _))));
        assert_eq!(s.reads.count_unread(&s.chat_id, &s.student).unwrap(), 1);
        assert!(s.outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_mark_messages_read_as_joined_user() {
        let s = scene().await;
        handle_command(
            &s.ctx,
            Command::Join {
                user_id: s.student,
                token: None,
            },
            &s.services,
        )
        .await
        .unwrap();

        handle_command(
            &s.ctx,
            Command::MarkMessagesRead {
                chat_id: s.chat_id,
                user_id: s.student,
                message_ids: vec![s.message_id],
            },
            &s.services,
        )
        .await
        .unwrap();

        assert_eq!(s.reads.count_unread(&s.chat_id, &s.student).unwrap(), 0);
    }

    #[tokio::test]
    async fn should_skip_malformed_frame() {
        let s = scene().await;

        let res = handle_text_frame(&s.ctx, "{not json", &s.services).await;

        assert!(res.is_ok());
        assert!(matches!(s.ctx.get_user_id().await, Err(event::Error::NotJoined)));
    }

    #[tokio::test]
    async fn should_forget_connection_on_close() {
        let mut s = scene().await;
        handle_command(
            &s.ctx,
            Command::Join {
                user_id: s.student,
                token: None,
            },
            &s.services,
        )
        .await
        .unwrap();
        handle_command(&s.ctx, Command::JoinChat { chat_id: s.chat_id }, &s.services)
            .await
            .unwrap();

        on_close(&s.ctx, &s.services).await;

        assert!(!s.services.event.is_online(&s.student).await);
        s.services.event.broadcast_to_room(&s.chat_id, unread(&s)).await;
        assert!(s.outbox.recv().await.is_none());
    }
}
