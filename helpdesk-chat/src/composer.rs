use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use helpdesk_client::Attachment;

/// A message ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl Draft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment: None,
        }
    }

    /// Trim the text and reject drafts with neither text nor a file.
    pub fn normalized(self) -> Option<Self> {
        let text = self.text.trim().to_owned();
        if text.is_empty() && self.attachment.is_none() {
            return None;
        }

        Some(Self {
            text,
            attachment: self.attachment,
        })
    }

    /// Local URL used to show the attached image before the server has it.
    pub fn preview_url(&self) -> Option<String> {
        self.attachment
            .as_ref()
            .filter(|attachment| attachment.is_image())
            .map(data_url)
    }
}

/// Input field, pending attachment and its preview.
#[derive(Clone, Debug, Default)]
pub struct Composer {
    input: String,
    attachment: Option<Attachment>,
    preview: Option<String>,
    focused: bool,
}

impl Composer {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Attach a file. Only images get a preview.
    pub fn select_file(&mut self, attachment: Attachment) {
        self.preview = attachment.is_image().then(|| data_url(&attachment));
        self.attachment = Some(attachment);
    }

    pub fn clear_file(&mut self) {
        self.attachment = None;
        self.preview = None;
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    /// Take the current draft, clearing the input and file preview. Leaves the
    /// composer untouched when there is nothing to send.
    pub fn take_draft(&mut self) -> Option<Draft> {
        let draft = Draft {
            text: self.input.clone(),
            attachment: self.attachment.clone(),
        }
        .normalized()?;

        self.input.clear();
        self.clear_file();
        Some(draft)
    }
}

pub fn data_url(attachment: &Attachment) -> String {
    format!(
        "data:{};base64,{}",
        attachment.mime,
        STANDARD.encode(&attachment.bytes)
    )
}
