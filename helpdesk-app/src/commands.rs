use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

use helpdesk_client::Attachment;
use helpdesk_core::{Error, MessageId, Rating};
use helpdesk_operator::{FilterQuery, SelectFilter};
use helpdesk_utils::COMMAND_PREFIX;

pub const HELP_TEXT: &str = "\
Commands:
  /rate <id> up|down       rate a bot reply
  /image [path]            attach a file to the next message (no path clears it)
  /quick <n>               send quick reply number n
  /voice                   dictate into the input
  /tickets [key=value ...] [search]
                           list operator tickets (keys: status, category, priority)
  /speedtest [gauge]       run the connection speed test
  /quit                    leave";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeedTestWidget {
    Counter,
    Gauge,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Say(String),
    Rate {
        message_id: MessageId,
        rating: Rating,
    },
    Attach(Option<PathBuf>),
    /// Zero-based index into the quick reply panel.
    Quick(usize),
    Voice,
    Tickets(FilterQuery),
    SpeedTest(SpeedTestWidget),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, Error> {
        let Some(rest) = line.trim().strip_prefix(COMMAND_PREFIX) else {
            return Ok(Self::Say(line.trim().to_owned()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        let command = match name.as_str() {
            "rate" => {
                let [id, vote] = args.as_slice() else {
                    bail!("usage: /rate <id> up|down");
                };
                let message_id = id
                    .parse::<u64>()
                    .map(MessageId)
                    .with_context(|| format!("invalid message id `{id}`"))?;
                let Some(rating) = Rating::parse(vote) else {
                    bail!("unknown rating `{vote}`, expected up or down");
                };
                Self::Rate { message_id, rating }
            }
            "image" => Self::Attach((!args.is_empty()).then(|| PathBuf::from(args.join(" ")))),
            "quick" => {
                let [number] = args.as_slice() else {
                    bail!("usage: /quick <n>");
                };
                let number = number
                    .parse::<usize>()
                    .ok()
                    .filter(|number| *number > 0)
                    .with_context(|| format!("invalid quick reply number `{number}`"))?;
                Self::Quick(number - 1)
            }
            "voice" => Self::Voice,
            "tickets" => Self::Tickets(parse_ticket_query(&args)),
            "speedtest" => match args.first().copied() {
                None | Some("counter") => Self::SpeedTest(SpeedTestWidget::Counter),
                Some("gauge") => Self::SpeedTest(SpeedTestWidget::Gauge),
                Some(other) => bail!("unknown speed test widget `{other}`"),
            },
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => bail!("unknown command `{}{}`", COMMAND_PREFIX, other),
        };

        Ok(command)
    }
}

fn parse_ticket_query(args: &[&str]) -> FilterQuery {
    let mut query = FilterQuery::default();
    let mut search = Vec::new();

    for arg in args {
        match arg.split_once('=') {
            Some(("status", value)) => query.status = SelectFilter::from_option(value),
            Some(("category", value)) => query.category = SelectFilter::from_option(value),
            Some(("priority", value)) => query.priority = SelectFilter::from_option(value),
            _ => search.push(*arg),
        }
    }

    query.search = search.join(" ");
    query
}

/// Read a file from disk as an upload, guessing the MIME type from its extension.
pub fn load_attachment(path: &Path) -> Result<Attachment, Error> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_owned());

    Ok(Attachment {
        mime: mime_for(path).to_owned(),
        file_name,
        bytes,
    })
}

fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        _ => "application/octet-stream",
    }
}
