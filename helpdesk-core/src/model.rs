use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned message identifier. Opaque to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's helpful / not helpful vote on a bot message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Rating {
    Helpful,
    NotHelpful,
}

impl Rating {
    pub fn value(self) -> i8 {
        match self {
            Self::Helpful => 1,
            Self::NotHelpful => -1,
        }
    }

    pub fn from_value(value: i8) -> Option<Self> {
        match value {
            1 => Some(Self::Helpful),
            -1 => Some(Self::NotHelpful),
            _ => None,
        }
    }

    /// Parse a user-typed vote (`up`, `+1`, `down`, `-1`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "+1" | "up" | "yes" | "helpful" | "+" => Some(Self::Helpful),
            "-1" | "down" | "no" | "unhelpful" | "not-helpful" | "-" => Some(Self::NotHelpful),
            _ => None,
        }
    }
}

impl From<Rating> for i8 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

impl TryFrom<i8> for Rating {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| format!("invalid rating value `{value}`"))
    }
}

/// One chat message as seen by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: Option<MessageId>,
    pub text: Option<String>,
    pub is_bot: bool,
    pub image_url: Option<String>,
    pub rating: Option<Rating>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            id: None,
            text: non_empty(text.into()),
            is_bot: false,
            image_url,
            rating: None,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: non_empty(text.into()),
            is_bot: true,
            image_url: None,
            rating: None,
        }
    }

    pub fn bot_with_id(text: impl Into<String>, id: Option<MessageId>) -> Self {
        Self {
            id,
            ..Self::bot(text)
        }
    }

    /// Bot messages with a persisted id can be rated.
    pub fn is_rateable(&self) -> bool {
        self.is_bot && self.id.is_some()
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}
