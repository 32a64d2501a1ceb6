use helpdesk_core::{ChatMessage, MessageId, Rating};

/// Sequence number handed to each chat submission.
pub type SubmissionId = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogEntry {
    Message(ChatMessage),
    /// Transient placeholder while the reply to a submission is pending.
    Typing(SubmissionId),
}

/// Append-only list of everything shown in the chat window.
///
/// Messages are never reordered or removed; only typing indicators are
/// transient, and only the `rating` of a message can change after insertion.
#[derive(Clone, Debug, Default)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
    scroll_position: usize,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.push(LogEntry::Message(message));
    }

    pub fn show_typing(&mut self, submission: SubmissionId) {
        self.push(LogEntry::Typing(submission));
    }

    /// Remove the typing indicator of `submission`. Returns whether one existed.
    pub fn hide_typing(&mut self, submission: SubmissionId) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !matches!(entry, LogEntry::Typing(id) if *id == submission));
        let removed = self.entries.len() != before;
        if removed {
            self.pin_to_bottom();
        }
        removed
    }

    /// Update the rating of a message. Returns false if the id is unknown.
    pub fn set_rating(&mut self, message_id: MessageId, rating: Option<Rating>) -> bool {
        let target = self.entries.iter_mut().find_map(|entry| match entry {
            LogEntry::Message(message) if message.id == Some(message_id) => Some(message),
            _ => None,
        });

        match target {
            Some(message) => {
                message.rating = rating;
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter().filter_map(|entry| match entry {
            LogEntry::Message(message) => Some(message),
            LogEntry::Typing(_) => None,
        })
    }

    pub fn message_count(&self) -> usize {
        self.messages().count()
    }

    pub fn typing_count(&self) -> usize {
        self.entries.len() - self.message_count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry the view is scrolled to; always the last one.
    pub fn scroll_position(&self) -> usize {
        self.scroll_position
    }

    fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
        self.pin_to_bottom();
    }

    fn pin_to_bottom(&mut self) {
        self.scroll_position = self.entries.len().saturating_sub(1);
    }
}
