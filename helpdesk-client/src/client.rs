use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use helpdesk_core::{ChatMessage, MessageId, Rating};

use crate::api::{
    Attachment, CHAT_PATH, CSRF_HEADER, ChatReply, HISTORY_PATH, HistoryResponse,
    NOTIFICATIONS_PATH, NotificationSummary, RATE_PATH, REQUESTED_WITH_HEADER,
    REQUESTED_WITH_VALUE, RateAck, RateRequest,
};
use crate::config::ClientConfig;
use crate::csrf::extract_csrf_token;
use crate::error::ClientError;

/// HTTP client for the helpdesk backend. Cheap to clone.
#[derive(Clone, Debug)]
pub struct HelpdeskClient {
    http: reqwest::Client,
    base_url: String,
    csrf_token: Option<String>,
}

impl HelpdeskClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base = Url::parse(config.base_url.trim())
            .map_err(|_| ClientError::InvalidUrl(config.base_url.clone()))?;

        let jar = Jar::default();
        if let Some(session) = config.session_cookie.as_deref() {
            jar.add_cookie_str(&format!("sessionid={}", session), &base);
        }

        let http = reqwest::Client::builder()
            .cookie_provider(Arc::new(jar))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base.as_str().trim_end_matches('/').to_owned(),
            csrf_token: config.csrf_token.clone(),
        })
    }

    pub fn with_csrf_token(mut self, token: Option<String>) -> Self {
        self.csrf_token = token;
        self
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // A missing token is sent as an empty header; the server decides.
    fn csrf_header_value(&self) -> &str {
        self.csrf_token.as_deref().unwrap_or_default()
    }

    /// Fetch a server-rendered page as text.
    pub async fn fetch_page(&self, path: &str) -> Result<String, ClientError> {
        let response = self.http.get(self.url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                endpoint: "page",
                status,
            });
        }

        Ok(response.text().await?)
    }

    /// Scrape the CSRF token from the hidden field of a server-rendered page.
    pub async fn fetch_csrf_token(&self, page_path: &str) -> Result<Option<String>, ClientError> {
        let html = self.fetch_page(page_path).await?;
        Ok(extract_csrf_token(&html))
    }

    pub async fn send_chat(
        &self,
        text: &str,
        image: Option<&Attachment>,
    ) -> Result<ChatReply, ClientError> {
        let mut form = Form::new().text("text", text.to_owned());
        if let Some(image) = image {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.mime)?;
            form = form.part("image", part);
        }

        let response = self
            .http
            .post(self.url(CHAT_PATH))
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE)
            .header(CSRF_HEADER, self.csrf_header_value())
            .multipart(form)
            .send()
            .await?;

        decode_json(CHAT_PATH, response).await
    }

    pub async fn chat_history(&self) -> Result<Vec<ChatMessage>, ClientError> {
        let response = self
            .http
            .get(self.url(HISTORY_PATH))
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE)
            .send()
            .await?;

        let history: HistoryResponse = decode_json(HISTORY_PATH, response).await?;
        debug!(count = history.messages.len(), "chat history fetched");

        Ok(history.messages.into_iter().map(Into::into).collect())
    }

    /// Returns the server's `success` flag.
    pub async fn rate_message(
        &self,
        message_id: MessageId,
        rating: Rating,
    ) -> Result<bool, ClientError> {
        let response = self
            .http
            .post(self.url(RATE_PATH))
            .header(CSRF_HEADER, self.csrf_header_value())
            .json(&RateRequest { message_id, rating })
            .send()
            .await?;

        let ack: RateAck = decode_json(RATE_PATH, response).await?;
        Ok(ack.success)
    }

    pub async fn unread_notifications(&self) -> Result<NotificationSummary, ClientError> {
        let response = self.http.get(self.url(NOTIFICATIONS_PATH)).send().await?;
        decode_json(NOTIFICATIONS_PATH, response).await
    }
}

async fn decode_json<T>(endpoint: &'static str, response: Response) -> Result<T, ClientError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status { endpoint, status });
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|source| ClientError::Decode { endpoint, source })
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use helpdesk_core::{MessageId, Rating};

    use super::HelpdeskClient;
    use crate::api::Attachment;
    use crate::config::ClientConfig;
    use crate::error::ClientError;

    fn client_for(server: &MockServer, token: Option<&str>) -> HelpdeskClient {
        let mut config = ClientConfig::new(server.base_url());
        config.csrf_token = token.map(str::to_owned);
        HelpdeskClient::new(&config).unwrap()
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = HelpdeskClient::new(&ClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn send_chat_posts_multipart_with_csrf_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/tickets/api/chat/")
                .header("x-csrftoken", "tok")
                .header("x-requested-with", "XMLHttpRequest")
                .body_includes("name=\"text\"")
                .body_includes("no internet")
                .body_includes("name=\"image\"");
            then.status(200)
                .json_body(json!({"reply": "restart your router", "message_id": 7}));
        });

        let client = client_for(&server, Some("tok"));
        let image = Attachment {
            file_name: "router.png".to_owned(),
            mime: "image/png".to_owned(),
            bytes: b"PNGDATA".to_vec(),
        };
        let reply = client.send_chat("no internet", Some(&image)).await.unwrap();

        mock.assert();
        assert_eq!(reply.reply.as_deref(), Some("restart your router"));
        assert_eq!(reply.message_id, Some(MessageId(7)));
    }

    #[tokio::test]
    async fn missing_csrf_token_is_sent_empty() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/tickets/api/chat/rate/")
                .header_exists("x-csrftoken")
                .json_body(json!({"message_id": 7, "rating": 1}));
            then.status(200).json_body(json!({"success": true, "rating": 1}));
        });

        let client = client_for(&server, None);
        let acknowledged = client
            .rate_message(MessageId(7), Rating::Helpful)
            .await
            .unwrap();

        mock.assert();
        assert!(acknowledged);
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/tickets/api/chat/history/");
            then.status(500).body("boom");
        });

        let err = client_for(&server, None).chat_history().await.unwrap_err();
        assert!(err.is_status());
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/tickets/api/operator/notifications/");
            then.status(200).body("<html>login</html>");
        });

        let err = client_for(&server, None)
            .unread_notifications()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[tokio::test]
    async fn history_preserves_server_order() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/tickets/api/chat/history/");
            then.status(200).json_body(json!({"messages": [
                {"id": 1, "text": "first", "is_bot": false, "image_url": null, "rating": null},
                {"id": 2, "text": "second", "is_bot": true, "image_url": null, "rating": 1},
                {"id": 3, "text": "third", "is_bot": false, "image_url": null, "rating": null}
            ]}));
        });

        let messages = client_for(&server, None).chat_history().await.unwrap();
        let texts: Vec<_> = messages.iter().filter_map(|m| m.text.as_deref()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert_eq!(messages[1].rating, Some(Rating::Helpful));
    }

    #[tokio::test]
    async fn scrapes_csrf_token_from_page() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/tickets/chat/");
            then.status(200).body(
                r#"<form><input type="hidden" name="csrfmiddlewaretoken" value="xyz"></form>"#,
            );
        });

        let token = client_for(&server, None)
            .fetch_csrf_token("/tickets/chat/")
            .await
            .unwrap();
        assert_eq!(token.as_deref(), Some("xyz"));
    }
}
