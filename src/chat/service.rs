use log::debug;

use crate::{message, read, user};

use super::model::{Chat, ChatDto, ChatInfoDto, Created, ParticipantDto};
use super::{Id, Kind, Repository};

#[async_trait::async_trait]
pub trait ChatService {
    async fn create_personal(&self, student: &user::Id, teacher: &user::Id) -> super::Result<Created>;

    async fn create_group(
        &self,
        teacher: &user::Id,
        group_name: &str,
        subject: &str,
    ) -> super::Result<Id>;

    async fn find_all(&self, user_id: &user::Id, kind: Option<Kind>) -> super::Result<Vec<ChatDto>>;

    async fn find_by_id(&self, id: &Id) -> super::Result<Chat>;

    async fn find_info(&self, id: &Id) -> super::Result<ChatInfoDto>;

    /// Fails with `NotFound` for an unknown chat and `NotParticipant` for an outsider.
    async fn check_member(&self, id: &Id, user_id: &user::Id) -> super::Result<()>;

    async fn find_members(&self, id: &Id) -> super::Result<Vec<user::Id>>;
}

#[derive(Clone)]
pub struct ChatServiceImpl {
    repo: Repository,
    user_repo: user::Repository,
    message_repo: message::Repository,
    read_repo: read::Repository,
}

impl ChatServiceImpl {
    pub fn new(
        repo: Repository,
        user_repo: user::Repository,
        message_repo: message::Repository,
        read_repo: read::Repository,
    ) -> Self {
        Self {
            repo,
            user_repo,
            message_repo,
            read_repo,
        }
    }
}

#[async_trait::async_trait]
impl ChatService for ChatServiceImpl {
    async fn create_personal(&self, student: &user::Id, teacher: &user::Id) -> super::Result<Created> {
        if student == teacher {
            return Err(super::Error::SameUsers);
        }

        for id in [student, teacher] {
            if !self.user_repo.exists(id)? {
                return Err(user::Error::NotFound(*id).into());
            }
        }

        let created = self.repo.create_personal(student, teacher)?;
        debug!("personal chat for {student} and {teacher}: {created:?}");
        Ok(created)
    }

    async fn create_group(
        &self,
        teacher: &user::Id,
        group_name: &str,
        subject: &str,
    ) -> super::Result<Id> {
        let group_name = group_name.trim();
        let subject = subject.trim();
        if group_name.is_empty() {
            return Err(super::Error::MissingField("group_name"));
        }
        if subject.is_empty() {
            return Err(super::Error::MissingField("subject"));
        }

        if !self.user_repo.exists(teacher)? {
            return Err(user::Error::NotFound(*teacher).into());
        }

        let mut members = vec![*teacher];
        members.extend(
            self.user_repo
                .find_students_by_group(group_name)?
                .iter()
                .map(|s| *s.user_id())
                .filter(|id| id != teacher),
        );

        let id = self.repo.create_group(subject, &members)?;
        debug!("group chat {id} created with {} members", members.len());
        Ok(id)
    }

    async fn find_all(&self, user_id: &user::Id, kind: Option<Kind>) -> super::Result<Vec<ChatDto>> {
        let chats = self.repo.find_by_user(user_id, kind)?;

        let mut dtos = Vec::with_capacity(chats.len());
        for chat in chats {
            dtos.push(self.chat_to_dto(chat, user_id)?);
        }

        Ok(dtos)
    }

    async fn find_by_id(&self, id: &Id) -> super::Result<Chat> {
        self.repo.find_by_id(id)
    }

    async fn find_info(&self, id: &Id) -> super::Result<ChatInfoDto> {
        let chat = self.repo.find_by_id(id)?;

        let mut participants = Vec::new();
        for p in self.repo.find_participants(id)? {
            let name = self.user_repo.find_display_name(p.user_id())?;
            participants.push(ParticipantDto::new(
                *p.user_id(),
                name.unwrap_or_else(|| p.user_id().to_string()),
            ));
        }

        Ok(ChatInfoDto::new(chat, participants))
    }

    async fn check_member(&self, id: &Id, user_id: &user::Id) -> super::Result<()> {
        let _ = self.repo.find_by_id(id)?;

        match self.repo.find_participant(id, user_id)? {
            Some(_) => Ok(()),
            None => Err(super::Error::NotParticipant(*id, *user_id)),
        }
    }

    async fn find_members(&self, id: &Id) -> super::Result<Vec<user::Id>> {
        let members = self
            .repo
            .find_participants(id)?
            .iter()
            .map(|p| *p.user_id())
            .collect();

        Ok(members)
    }
}

impl ChatServiceImpl {
    fn chat_to_dto(&self, chat: Chat, user_id: &user::Id) -> super::Result<ChatDto> {
        let last_message = self
            .message_repo
            .find_last(chat.id())
            .map_err(Box::new)?
            .map(Into::into);

        let unread_count = self
            .read_repo
            .count_unread(chat.id(), user_id)
            .map_err(Box::new)?;

        let partner_name = match chat.kind() {
            Kind::Group => None,
            Kind::Personal => {
                let partner = self
                    .repo
                    .find_participants(chat.id())?
                    .into_iter()
                    .find(|p| p.user_id() != user_id);

                match partner {
                    Some(p) => self.user_repo.find_display_name(p.user_id())?,
                    None => None,
                }
            }
        };

        Ok(ChatDto::new(chat, last_message, unread_count, partner_name))
    }
}
