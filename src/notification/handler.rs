use axum::http::StatusCode;

impl From<&super::Error> for StatusCode {
    fn from(e: &super::Error) -> Self {
        match e {
            super::Error::MissingField(_)
            | super::Error::InvalidToken(_)
            | super::Error::InvalidCategory(_) => Self::BAD_REQUEST,
            super::Error::NoDestination(_) => Self::NOT_FOUND,
            super::Error::_User(e) => e.into(),
            super::Error::_Json(_) | super::Error::_R2d2(_) | super::Error::_Diesel(_) => {
                Self::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub(super) mod api {
    use axum::extract::State;
    use serde::Deserialize;
    use serde_json::{Value, json};

    use crate::extract::{Json, Query};
    use crate::{
        Success,
        notification::{self, Category, model::DispatchReport, model::NotificationDto},
        page, user,
    };

    #[derive(Deserialize)]
    pub struct RegisterPushTokenParams {
        user_id: Option<user::Id>,
        token: Option<String>,
    }

    pub async fn register_push_token(
        notification_service: State<notification::Service>,
        Json(params): Json<RegisterPushTokenParams>,
    ) -> crate::Result<Success<Value>> {
        let user_id = params
            .user_id
            .ok_or(notification::Error::MissingField("user_id"))?;
        let token = params
            .token
            .ok_or(notification::Error::MissingField("token"))?;

        notification_service
            .register_push_token(&user_id, &token)
            .await?;

        Ok(Success(json!({ "message": "Push token saved" })))
    }

    #[derive(Deserialize)]
    pub struct FindPageParams {
        user_id: Option<user::Id>,
        #[serde(rename = "type")]
        category: Option<String>,
        page: Option<i64>,
        per_page: Option<i64>,
    }

    pub async fn find_page(
        notification_service: State<notification::Service>,
        Query(params): Query<FindPageParams>,
    ) -> crate::Result<Success<page::Page<NotificationDto>>> {
        let user_id = params
            .user_id
            .ok_or(notification::Error::MissingField("user_id"))?;
        let category = match params.category.as_deref() {
            None | Some("all") => None,
            Some(c) => Some(
                c.parse::<Category>()
                    .map_err(|_| notification::Error::InvalidCategory(c.to_string()))?,
            ),
        };

        let page = page::Params::from_query(params.page, params.per_page);
        let page = notification_service
            .find_page(&user_id, category, &page)
            .await?;

        Ok(Success(page))
    }

    #[derive(Deserialize)]
    pub struct MarkReadParams {
        user_id: Option<user::Id>,
        #[serde(default)]
        notification_ids: Vec<notification::Id>,
    }

    pub async fn mark_read(
        notification_service: State<notification::Service>,
        Json(params): Json<MarkReadParams>,
    ) -> crate::Result<Success<Value>> {
        let user_id = params
            .user_id
            .ok_or(notification::Error::MissingField("user_id"))?;

        let updated = notification_service
            .mark_read(&user_id, &params.notification_ids)
            .await?;

        Ok(Success(json!({ "updated": updated })))
    }

    #[derive(Deserialize)]
    pub struct SendTestParams {
        user_id: Option<user::Id>,
    }

    pub async fn send_test(
        notification_service: State<notification::Service>,
        Json(params): Json<SendTestParams>,
    ) -> crate::Result<Success<DispatchReport>> {
        let user_id = params
            .user_id
            .ok_or(notification::Error::MissingField("user_id"))?;

        let report = notification_service.send_test(&user_id).await?;
        Ok(Success(report))
    }
}
