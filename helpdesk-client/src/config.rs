use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CSRF_PAGE: &str = "/tickets/chat/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the helpdesk backend.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    /// Token sent as `X-CSRFToken`. When absent it may be scraped from `csrf_page`.
    pub csrf_token: Option<String>,
    pub csrf_page: String,
    /// Django `sessionid` cookie of an already authenticated user.
    pub session_cookie: Option<String>,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            csrf_token: None,
            csrf_page: DEFAULT_CSRF_PAGE.to_owned(),
            session_cookie: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Self {
        let base_url = env_trimmed("HELPDESK_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let csrf_page =
            env_trimmed("HELPDESK_CSRF_PAGE").unwrap_or_else(|| DEFAULT_CSRF_PAGE.to_owned());
        let timeout_secs = env::var("HELPDESK_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            base_url,
            csrf_token: env_trimmed("HELPDESK_CSRF_TOKEN"),
            csrf_page,
            session_cookie: env_trimmed("HELPDESK_SESSION_COOKIE"),
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

fn env_trimmed(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
