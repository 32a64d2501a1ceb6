pub mod model;

pub use model::{ChatMessage, MessageId, Rating};

pub type Error = anyhow::Error;
