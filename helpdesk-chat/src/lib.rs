pub mod composer;
pub mod log;
pub mod quick_replies;
pub mod render;
pub mod session;
pub mod voice;

pub use composer::{Composer, Draft};
pub use log::{LogEntry, MessageLog, SubmissionId};
pub use quick_replies::{QuickReplies, QuickReply};
pub use render::{BubbleView, RatingControls, render_log};
pub use session::{
    APOLOGY, ChatSession, ChatView, GREETING, HistoryOutcome, RateOutcome, SubmitOutcome,
    VoiceButton,
};
pub use voice::{RecognitionEvent, RecognitionSettings, SpeechRecognizer, VoiceInput, VoiceOutcome};
