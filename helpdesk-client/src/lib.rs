pub mod api;
pub mod client;
pub mod config;
pub mod csrf;
pub mod error;

pub use api::{Attachment, ChatReply, HistoryEntry, NotificationSummary};
pub use client::HelpdeskClient;
pub use config::ClientConfig;
pub use error::ClientError;
