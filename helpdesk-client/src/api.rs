//! Wire shapes of the helpdesk backend endpoints.

use serde::{Deserialize, Serialize};

use helpdesk_core::{ChatMessage, MessageId, Rating};

pub const CHAT_PATH: &str = "/tickets/api/chat/";
pub const HISTORY_PATH: &str = "/tickets/api/chat/history/";
pub const RATE_PATH: &str = "/tickets/api/chat/rate/";
pub const NOTIFICATIONS_PATH: &str = "/tickets/api/operator/notifications/";
/// Server-rendered operator ticket list.
pub const OPERATOR_TICKETS_PATH: &str = "/tickets/operator/";

/// Hidden form field carrying the CSRF token on server-rendered pages.
pub const CSRF_FIELD_NAME: &str = "csrfmiddlewaretoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

/// A file picked by the user for upload alongside a chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub message_id: Option<MessageId>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<HistoryEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<MessageId>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    // Kept loose: an out-of-range stored value must not break history playback.
    #[serde(default)]
    pub rating: Option<i8>,
}

impl From<HistoryEntry> for ChatMessage {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            id: entry.id,
            text: entry.text.filter(|text| !text.is_empty()),
            is_bot: entry.is_bot,
            image_url: entry.image_url.filter(|url| !url.is_empty()),
            rating: entry.rating.and_then(Rating::from_value),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct RateRequest {
    pub message_id: MessageId,
    pub rating: Rating,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct RateAck {
    #[serde(default)]
    pub success: bool,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct NotificationSummary {
    #[serde(default)]
    pub unread_count: u64,
}
