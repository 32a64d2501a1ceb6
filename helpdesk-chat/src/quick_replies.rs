/// A preset button that fills and submits the input with canned text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuickReply {
    pub label: String,
    pub text: String,
}

impl QuickReply {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Quick-reply panel. Hidden until an empty chat is detected.
#[derive(Clone, Debug)]
pub struct QuickReplies {
    options: Vec<QuickReply>,
    visible: bool,
}

impl Default for QuickReplies {
    fn default() -> Self {
        Self::new(default_quick_replies())
    }
}

impl QuickReplies {
    pub fn new(options: Vec<QuickReply>) -> Self {
        Self {
            options,
            visible: false,
        }
    }

    pub fn options(&self) -> &[QuickReply] {
        &self.options
    }

    pub fn get(&self, index: usize) -> Option<&QuickReply> {
        self.options.get(index)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

pub fn default_quick_replies() -> Vec<QuickReply> {
    vec![
        QuickReply::new("Нет интернета", "У меня не работает интернет"),
        QuickReply::new("Низкая скорость", "Очень низкая скорость интернета"),
        QuickReply::new("Не работает ТВ", "Не работает телевидение"),
        QuickReply::new("Оплата", "Вопрос по оплате услуг"),
    ]
}
