//! Pure mapping from the message log to bubble views.

use helpdesk_core::{ChatMessage, MessageId, Rating};
use helpdesk_utils::html::escape_html;

use crate::log::{LogEntry, MessageLog};

pub const USER_BUBBLE_CLASS: &str = "msg-bubble msg-user";
pub const BOT_BUBBLE_CLASS: &str = "msg-bubble msg-bot";
pub const HELPFUL_SELECTED_CLASS: &str = "btn btn-sm btn-success";
pub const NOT_HELPFUL_SELECTED_CLASS: &str = "btn btn-sm btn-danger";
pub const UNSELECTED_CLASS: &str = "btn btn-sm btn-outline-secondary";
pub const HELPFUL_LABEL: &str = "👍 Полезно";
pub const NOT_HELPFUL_LABEL: &str = "👎 Не помогло";
pub const TYPING_LABEL: &str = "AI печатает...";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Start,
    End,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RatingButton {
    pub label: &'static str,
    pub class: &'static str,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RatingControls {
    pub message_id: MessageId,
    pub helpful: RatingButton,
    pub not_helpful: RatingButton,
}

impl RatingControls {
    pub fn for_rating(message_id: MessageId, rating: Option<Rating>) -> Self {
        let helpful = rating == Some(Rating::Helpful);
        let not_helpful = rating == Some(Rating::NotHelpful);

        Self {
            message_id,
            helpful: RatingButton {
                label: HELPFUL_LABEL,
                class: if helpful { HELPFUL_SELECTED_CLASS } else { UNSELECTED_CLASS },
                selected: helpful,
            },
            not_helpful: RatingButton {
                label: NOT_HELPFUL_LABEL,
                class: if not_helpful {
                    NOT_HELPFUL_SELECTED_CLASS
                } else {
                    UNSELECTED_CLASS
                },
                selected: not_helpful,
            },
        }
    }

    pub fn selected_count(&self) -> usize {
        usize::from(self.helpful.selected) + usize::from(self.not_helpful.selected)
    }
}

/// Everything needed to draw one bubble.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BubbleView {
    pub alignment: Alignment,
    pub class: &'static str,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub rating: Option<RatingControls>,
    pub typing: bool,
}

impl BubbleView {
    pub fn from_message(message: &ChatMessage) -> Self {
        let rating = match (message.is_bot, message.id) {
            (true, Some(id)) => Some(RatingControls::for_rating(id, message.rating)),
            _ => None,
        };

        Self {
            alignment: if message.is_bot {
                Alignment::Start
            } else {
                Alignment::End
            },
            class: if message.is_bot {
                BOT_BUBBLE_CLASS
            } else {
                USER_BUBBLE_CLASS
            },
            text: message.text.clone(),
            image_url: message.image_url.clone(),
            rating,
            typing: false,
        }
    }

    pub fn typing_indicator() -> Self {
        Self {
            alignment: Alignment::Start,
            class: BOT_BUBBLE_CLASS,
            text: Some(TYPING_LABEL.to_owned()),
            image_url: None,
            rating: None,
            typing: true,
        }
    }

    /// HTML fragment for the bubble. Text is escaped the way `textContent` would be.
    pub fn to_html(&self) -> String {
        let wrapper_class = match self.alignment {
            Alignment::Start => "d-flex mb-3",
            Alignment::End => "d-flex mb-3 justify-content-end",
        };

        let mut inner = String::new();
        if self.typing {
            inner.push_str(r#"<div class="typing-dots"><span></span><span></span><span></span></div>"#);
            inner.push_str(&format!(r#"<div class="typing-text">{}</div>"#, TYPING_LABEL));
        } else {
            if let Some(url) = &self.image_url {
                inner.push_str(&format!(
                    r#"<img src="{}" class="img-fluid rounded mb-2">"#,
                    escape_html(url)
                ));
            }
            if let Some(text) = &self.text {
                inner.push_str(&format!("<div>{}</div>", escape_html(text)));
            }
            if let Some(controls) = &self.rating {
                inner.push_str(&format!(
                    r#"<div class="mt-2 d-flex gap-2 align-items-center" data-message-id="{id}"><button class="{}" data-rating="1">{}</button><button class="{}" data-rating="-1">{}</button></div>"#,
                    controls.helpful.class,
                    controls.helpful.label,
                    controls.not_helpful.class,
                    controls.not_helpful.label,
                    id = controls.message_id,
                ));
            }
        }

        format!(
            r#"<div class="{}"><div class="{}">{}</div></div>"#,
            wrapper_class, self.class, inner
        )
    }

    /// One-line rendering for a terminal.
    pub fn to_terminal(&self) -> String {
        if self.typing {
            return format!("  … {}", TYPING_LABEL);
        }

        let speaker = match (self.alignment, &self.rating) {
            (Alignment::End, _) => "you".to_owned(),
            (Alignment::Start, Some(controls)) => format!("bot #{}", controls.message_id),
            (Alignment::Start, None) => "bot".to_owned(),
        };

        let mut line = format!("[{}]", speaker);
        if let Some(url) = &self.image_url {
            if url.starts_with("data:") {
                line.push_str(" (image attached)");
            } else {
                line.push_str(&format!(" (image: {})", url));
            }
        }
        if let Some(text) = &self.text {
            line.push(' ');
            line.push_str(text);
        }
        if let Some(controls) = &self.rating {
            line.push_str(&format!(
                "  {}{}  {}{}",
                if controls.helpful.selected { "*" } else { "" },
                controls.helpful.label,
                if controls.not_helpful.selected { "*" } else { "" },
                controls.not_helpful.label,
            ));
        }
        line
    }
}

pub fn render_entry(entry: &LogEntry) -> BubbleView {
    match entry {
        LogEntry::Message(message) => BubbleView::from_message(message),
        LogEntry::Typing(_) => BubbleView::typing_indicator(),
    }
}

pub fn render_log(log: &MessageLog) -> Vec<BubbleView> {
    log.entries().iter().map(render_entry).collect()
}

#[cfg(test)]
mod tests {
    use helpdesk_core::{ChatMessage, MessageId, Rating};

    use super::{
        Alignment, BubbleView, HELPFUL_SELECTED_CLASS, NOT_HELPFUL_SELECTED_CLASS,
        UNSELECTED_CLASS, render_log,
    };
    use crate::log::MessageLog;

    #[test]
    fn user_bubbles_align_right_without_controls() {
        let view = BubbleView::from_message(&ChatMessage::user("hello", None));
        assert_eq!(view.alignment, Alignment::End);
        assert!(view.rating.is_none());
        assert!(view.to_html().contains("justify-content-end"));
    }

    #[test]
    fn bot_bubbles_with_id_get_rating_controls() {
        let mut message = ChatMessage::bot_with_id("restart your router", Some(MessageId(7)));
        let view = BubbleView::from_message(&message);
        let controls = view.rating.as_ref().unwrap();
        assert_eq!(controls.helpful.class, UNSELECTED_CLASS);
        assert_eq!(controls.not_helpful.class, UNSELECTED_CLASS);
        assert_eq!(controls.selected_count(), 0);

        message.rating = Some(Rating::NotHelpful);
        let controls = BubbleView::from_message(&message).rating.unwrap();
        assert_eq!(controls.not_helpful.class, NOT_HELPFUL_SELECTED_CLASS);
        assert_eq!(controls.helpful.class, UNSELECTED_CLASS);

        message.rating = Some(Rating::Helpful);
        let controls = BubbleView::from_message(&message).rating.unwrap();
        assert_eq!(controls.helpful.class, HELPFUL_SELECTED_CLASS);
        assert_eq!(controls.selected_count(), 1);
    }

    #[test]
    fn bot_bubbles_without_id_are_not_rateable() {
        assert!(BubbleView::from_message(&ChatMessage::bot("hi")).rating.is_none());
    }

    #[test]
    fn html_escapes_message_text() {
        let html = BubbleView::from_message(&ChatMessage::user("<script>x</script>", None)).to_html();
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn image_is_rendered_before_text() {
        let message = ChatMessage::user("see photo", Some("/media/router.png".to_owned()));
        let html = BubbleView::from_message(&message).to_html();
        let img = html.find("<img").unwrap();
        let text = html.find("see photo").unwrap();
        assert!(img < text);
    }

    #[test]
    fn render_log_maps_entries_in_order() {
        let mut log = MessageLog::new();
        log.append(ChatMessage::user("q", None));
        log.show_typing(1);

        let views = render_log(&log);
        assert_eq!(views.len(), 2);
        assert!(!views[0].typing);
        assert!(views[1].typing);
    }

    #[test]
    fn terminal_line_marks_selected_rating() {
        let mut message = ChatMessage::bot_with_id("ok", Some(MessageId(3)));
        message.rating = Some(Rating::Helpful);
        let line = BubbleView::from_message(&message).to_terminal();
        assert!(line.starts_with("[bot #3] ok"));
        assert!(line.contains("*👍"));
    }
}
