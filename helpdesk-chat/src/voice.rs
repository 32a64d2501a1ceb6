use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

pub const DEFAULT_RECOGNITION_LANG: &str = "ru-RU";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognitionSettings {
    pub lang: String,
    pub interim_results: bool,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            lang: DEFAULT_RECOGNITION_LANG.to_owned(),
            interim_results: false,
        }
    }
}

/// Whichever recognition event arrives first for a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecognitionEvent {
    Transcript(String),
    Error(String),
    End,
}

/// A speech-recognition capability supplied by the host environment.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Run one recognition session and report its first event.
    async fn recognize(&self, settings: &RecognitionSettings) -> RecognitionEvent;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoiceOutcome {
    Unavailable,
    Busy,
    Transcribed(String),
    Failed(String),
    Ended,
}

/// Microphone button state plus the optional recognizer behind it.
#[derive(Clone, Default)]
pub struct VoiceInput {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    settings: RecognitionSettings,
    busy: Arc<AtomicBool>,
}

impl VoiceInput {
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>) -> Self {
        Self {
            recognizer,
            settings: RecognitionSettings::default(),
            busy: Arc::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run one session. The busy flag is held for its whole duration and
    /// cleared when it ends, including when the future is dropped mid-session.
    pub async fn listen(&self) -> VoiceOutcome {
        let Some(recognizer) = &self.recognizer else {
            return VoiceOutcome::Unavailable;
        };

        let Some(_listening) = ListeningGuard::acquire(&self.busy) else {
            return VoiceOutcome::Busy;
        };

        let event = recognizer.recognize(&self.settings).await;

        match event {
            RecognitionEvent::Transcript(text) => VoiceOutcome::Transcribed(text),
            RecognitionEvent::Error(reason) => VoiceOutcome::Failed(reason),
            RecognitionEvent::End => VoiceOutcome::Ended,
        }
    }
}

struct ListeningGuard {
    busy: Arc<AtomicBool>,
}

impl ListeningGuard {
    fn acquire(busy: &Arc<AtomicBool>) -> Option<Self> {
        if busy.swap(true, Ordering::AcqRel) {
            return None;
        }

        Some(Self {
            busy: Arc::clone(busy),
        })
    }
}

impl Drop for ListeningGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for VoiceInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceInput")
            .field("available", &self.is_available())
            .field("settings", &self.settings)
            .field("busy", &self.is_busy())
            .finish()
    }
}
