use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use helpdesk_client::{Attachment, HelpdeskClient};
use helpdesk_core::{ChatMessage, MessageId, Rating};

use crate::composer::{Composer, Draft};
use crate::log::{MessageLog, SubmissionId};
use crate::quick_replies::{QuickReplies, QuickReply};
use crate::render::{BubbleView, render_log};
use crate::voice::{VoiceInput, VoiceOutcome};

pub const GREETING: &str =
    "Здравствуйте! Я ИИ-помощник Казахтелеком. Опишите вашу проблему, и я помогу найти решение.";
pub const APOLOGY: &str = "Произошла ошибка. Попробуйте ещё раз или обратитесь к оператору.";
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryOutcome {
    Replayed(usize),
    Empty,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing to send; no request was made.
    Skipped,
    Replied {
        submission: SubmissionId,
        message_id: Option<MessageId>,
    },
    /// The server answered without a `reply`.
    NoReply { submission: SubmissionId },
    Failed { submission: SubmissionId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateOutcome {
    Applied,
    Rejected,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceButton {
    Hidden,
    Idle,
    Busy,
}

/// Snapshot of everything the chat page shows.
#[derive(Clone, Debug)]
pub struct ChatView {
    pub bubbles: Vec<BubbleView>,
    pub scroll_position: usize,
    pub quick_replies: Option<Vec<QuickReply>>,
    pub input: String,
    pub input_focused: bool,
    pub file_preview: Option<String>,
    pub voice_button: VoiceButton,
}

#[derive(Debug, Default)]
struct ChatState {
    log: MessageLog,
    composer: Composer,
    quick_replies: QuickReplies,
}

/// One chat window bound to a backend. Clones share the same window.
#[derive(Clone, Debug)]
pub struct ChatSession {
    client: HelpdeskClient,
    state: Arc<RwLock<ChatState>>,
    voice: VoiceInput,
    last_submission: Arc<AtomicU64>,
    reply_delay: Duration,
}

impl ChatSession {
    pub fn new(client: HelpdeskClient) -> Self {
        Self {
            client,
            state: Arc::default(),
            voice: VoiceInput::default(),
            last_submission: Arc::default(),
            reply_delay: DEFAULT_REPLY_DELAY,
        }
    }

    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    pub fn with_voice(mut self, voice: VoiceInput) -> Self {
        self.voice = voice;
        self
    }

    /// Replace the preset replies. Starts a fresh window, so call it before use.
    pub fn with_quick_replies(mut self, options: Vec<QuickReply>) -> Self {
        self.state = Arc::new(RwLock::new(ChatState {
            quick_replies: QuickReplies::new(options),
            ..ChatState::default()
        }));
        self
    }

    pub fn client(&self) -> &HelpdeskClient {
        &self.client
    }

    pub async fn view(&self) -> ChatView {
        let state = self.state.read().await;

        ChatView {
            bubbles: render_log(&state.log),
            scroll_position: state.log.scroll_position(),
            quick_replies: state
                .quick_replies
                .is_visible()
                .then(|| state.quick_replies.options().to_vec()),
            input: state.composer.input().to_owned(),
            input_focused: state.composer.is_focused(),
            file_preview: state.composer.preview().map(str::to_owned),
            voice_button: if !self.voice.is_available() {
                VoiceButton::Hidden
            } else if self.voice.is_busy() {
                VoiceButton::Busy
            } else {
                VoiceButton::Idle
            },
        }
    }

    /// Append a message to the end of the log.
    pub async fn append_message(&self, message: ChatMessage) {
        self.state.write().await.log.append(message);
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        self.state.write().await.composer.set_input(text);
    }

    pub async fn select_file(&self, attachment: Attachment) {
        self.state.write().await.composer.select_file(attachment);
    }

    pub async fn clear_file(&self) {
        self.state.write().await.composer.clear_file();
    }

    /// Replay prior messages, or greet when there are none.
    pub async fn load_history(&self) -> HistoryOutcome {
        let fetched = self.client.chat_history().await;
        let mut state = self.state.write().await;

        match fetched {
            Ok(messages) if !messages.is_empty() => {
                let count = messages.len();
                for message in messages {
                    state.log.append(message);
                }
                state.quick_replies.hide();
                info!(count, "chat history replayed");
                HistoryOutcome::Replayed(count)
            }
            Ok(_) => {
                state.log.append(ChatMessage::bot(GREETING));
                state.quick_replies.show();
                HistoryOutcome::Empty
            }
            Err(source) => {
                warn!(?source, "failed to load chat history; showing greeting");
                state.log.append(ChatMessage::bot(GREETING));
                HistoryOutcome::Failed
            }
        }
    }

    /// Send whatever is in the composer.
    pub async fn submit(&self) -> SubmitOutcome {
        match self.take_draft().await {
            Some(draft) => self.dispatch(draft).await,
            None => SubmitOutcome::Skipped,
        }
    }

    /// Empty the composer, returning what it held if there is anything to send.
    pub async fn take_draft(&self) -> Option<Draft> {
        self.state.write().await.composer.take_draft()
    }

    /// Send a draft directly. Drafts without text or file are skipped.
    pub async fn submit_draft(&self, draft: Draft) -> SubmitOutcome {
        match draft.normalized() {
            Some(draft) => self.dispatch(draft).await,
            None => SubmitOutcome::Skipped,
        }
    }

    /// Fill the input with a preset reply, send it and hide the panel.
    /// Returns `None` while the panel is hidden or for an unknown index.
    pub async fn quick_reply(&self, index: usize) -> Option<SubmitOutcome> {
        let text = {
            let mut state = self.state.write().await;
            if !state.quick_replies.is_visible() {
                debug!(index, "quick reply panel is hidden");
                return None;
            }
            let text = state.quick_replies.get(index)?.text.clone();
            state.composer.set_input(text.clone());
            state.quick_replies.hide();
            text
        };

        debug!(index, text = %text, "quick reply selected");
        Some(self.submit().await)
    }

    async fn dispatch(&self, draft: Draft) -> SubmitOutcome {
        let submission = self.last_submission.fetch_add(1, Ordering::Relaxed) + 1;

        {
            let mut state = self.state.write().await;
            state
                .log
                .append(ChatMessage::user(draft.text.clone(), draft.preview_url()));
            state.log.show_typing(submission);
        }

        let result = self
            .client
            .send_chat(&draft.text, draft.attachment.as_ref())
            .await;

        self.state.write().await.log.hide_typing(submission);

        match result {
            Ok(reply) => {
                let Some(text) = reply.reply.filter(|text| !text.is_empty()) else {
                    debug!(submission, "chat response carried no reply");
                    return SubmitOutcome::NoReply { submission };
                };

                sleep(self.reply_delay).await;
                self.state
                    .write()
                    .await
                    .log
                    .append(ChatMessage::bot_with_id(text, reply.message_id));

                SubmitOutcome::Replied {
                    submission,
                    message_id: reply.message_id,
                }
            }
            Err(source) => {
                error!(?source, submission, "chat submission failed");
                self.state
                    .write()
                    .await
                    .log
                    .append(ChatMessage::bot(APOLOGY));
                SubmitOutcome::Failed { submission }
            }
        }
    }

    /// Vote on a bot message. The log only changes once the server acknowledges.
    pub async fn rate(&self, message_id: MessageId, rating: Rating) -> RateOutcome {
        match self.client.rate_message(message_id, rating).await {
            Ok(true) => {
                let found = self
                    .state
                    .write()
                    .await
                    .log
                    .set_rating(message_id, Some(rating));
                if !found {
                    debug!(%message_id, "rated message is not in the log");
                }
                RateOutcome::Applied
            }
            Ok(false) => {
                warn!(%message_id, "rating was not acknowledged");
                RateOutcome::Rejected
            }
            Err(source) => {
                error!(?source, %message_id, "rating request failed");
                RateOutcome::Failed
            }
        }
    }

    /// Dictate into the input field.
    pub async fn listen(&self) -> VoiceOutcome {
        let outcome = self.voice.listen().await;

        if let VoiceOutcome::Transcribed(text) = &outcome {
            let mut state = self.state.write().await;
            state.composer.set_input(text.clone());
            state.composer.focus();
        }

        outcome
    }
}
