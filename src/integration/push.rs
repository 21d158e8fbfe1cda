use std::env;
use std::time::Duration;

use log::warn;
use url::Url;

const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Clone)]
pub struct Config {
    url: Url,
    timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: Url::parse(EXPO_PUSH_URL).expect("default push url is valid"),
            timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    pub fn new(url: Url, timeout: Duration) -> Self {
        Self { url, timeout }
    }

    pub fn env() -> Option<Self> {
        let url = env::var("PUSH_URL")
            .ok()
            .and_then(|u| Url::parse(&u).map_err(|e| warn!("Invalid PUSH_URL: {e}")).ok());
        let timeout = env::var("PUSH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .ok()
            .map(Duration::from_secs);

        if let (Some(url), Some(timeout)) = (url, timeout) {
            Some(Self { url, timeout })
        } else {
            warn!("Push provider env is not configured");
            None
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Upper bound for a single push delivery.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}
