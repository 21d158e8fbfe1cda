use log::debug;
use serde::Deserialize;
use url::Url;

use crate::integration::{self, push};

use super::model::PushMessage;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure to deliver to one destination. Never leaves the dispatcher.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("push provider unreachable: {0}")]
    Provider(#[from] reqwest::Error),
    #[error("push rejected by provider: {0}")]
    Rejected(String),
    #[error("malformed push ticket: {0}")]
    MalformedTicket(String),
    #[error("push delivery timed out")]
    Timeout,
}

#[async_trait::async_trait]
pub trait PushClient {
    async fn send(&self, message: &PushMessage) -> Result<()>;
}

pub fn is_valid_token(token: &str) -> bool {
    ["ExponentPushToken[", "ExpoPushToken["]
        .iter()
        .any(|prefix| token.starts_with(prefix) && token.len() > prefix.len() + 1)
        && token.ends_with(']')
}

#[derive(Clone)]
pub struct ExpoPushClient {
    http: reqwest::Client,
    url: Url,
}

impl ExpoPushClient {
    pub fn new(config: &push::Config) -> Self {
        Self {
            http: integration::init_http_client(config.timeout()),
            url: config.url().clone(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct TicketResponse {
    data: Ticket,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Ticket {
    Ok {
        id: Option<String>,
    },
    Error {
        message: Option<String>,
        details: Option<serde_json::Value>,
    },
}

#[async_trait::async_trait]
impl PushClient for ExpoPushClient {
    async fn send(&self, message: &PushMessage) -> Result<()> {
        let body = self
            .http
            .post(self.url.clone())
            .json(message)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_ticket(&body)
    }
}

fn parse_ticket(body: &str) -> Result<()> {
    let ticket = serde_json::from_str::<TicketResponse>(body)
        .map_err(|e| Error::MalformedTicket(e.to_string()))?;

    match ticket.data {
        Ticket::Ok { id } => {
            debug!("Push accepted, ticket {id:?}");
            Ok(())
        }
        Ticket::Error { message, details } => Err(Error::Rejected(format!(
            "{} {}",
            message.unwrap_or_default(),
            details.map(|d| d.to_string()).unwrap_or_default()
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_accept_expo_tokens_only() {
        assert!(is_valid_token("ExponentPushToken[xxxxxxxxxxxxxxxxxxxxxx]"));
        assert!(is_valid_token("ExpoPushToken[abc]"));
        assert!(!is_valid_token("ExponentPushToken[]"));
        assert!(!is_valid_token("fcm:abc"));
        assert!(!is_valid_token(""));
    }

    #[test]
    fn should_parse_ok_ticket() {
        let res = parse_ticket(r#"{"data": {"status": "ok", "id": "XXXX-XXXX"}}"#);

        assert!(res.is_ok());
    }

    #[test]
    fn should_reject_error_ticket() {
        let res = parse_ticket(
            r#"{"data": {"status": "error", "message": "not registered", "details": {"error": "DeviceNotRegistered"}}}"#,
        );

        assert!(matches!(res, Err(Error::Rejected(m)) if m.contains("DeviceNotRegistered")));
    }

    #[test]
    fn should_report_malformed_ticket() {
        let res = parse_ticket(r#"{"data": [{"status": "ok"}]}"#);

        assert!(matches!(res, Err(Error::MalformedTicket(_))));
    }
}
