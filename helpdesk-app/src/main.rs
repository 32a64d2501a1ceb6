mod commands;
mod terminal;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;

use helpdesk_chat::{ChatSession, HistoryOutcome};
use helpdesk_client::{ClientConfig, HelpdeskClient};
use helpdesk_operator::NotificationPoller;
use helpdesk_operator::notifications::DEFAULT_POLL_INTERVAL;
use helpdesk_speedtest::HttpProbe;

use crate::commands::Command;
use crate::terminal::{Flow, Terminal};

const DEFAULT_REPLY_DELAY_MS: u64 = 300;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !(target.starts_with("hyper_util::client::legacy::pool")
            || target.starts_with("reqwest::connect"))
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env();
    let mut client = HelpdeskClient::new(&config)?;
    info!(base_url = %client.base_url(), "helpdesk client ready.");

    if client.csrf_token().is_none() {
        match client.fetch_csrf_token(&config.csrf_page).await {
            Ok(Some(token)) => {
                client = client.with_csrf_token(Some(token));
                info!(page = %config.csrf_page, "CSRF token scraped.");
            }
            Ok(None) => {
                warn!(page = %config.csrf_page, "no CSRF token on page; posts may be rejected.")
            }
            Err(source) => {
                warn!(?source, page = %config.csrf_page, "failed to fetch CSRF page; posts may be rejected.")
            }
        }
    }

    let reply_delay = Duration::from_millis(env_u64("HELPDESK_REPLY_DELAY_MS", DEFAULT_REPLY_DELAY_MS));
    let session = ChatSession::new(client.clone()).with_reply_delay(reply_delay);

    if env_bool("HELPDESK_OPERATOR", false) {
        let period = Duration::from_secs(env_u64(
            "HELPDESK_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL.as_secs(),
        ))
        .max(Duration::from_secs(1));
        spawn_badge_logger(NotificationPoller::new(client.clone(), period));
        info!(poll_interval_secs = period.as_secs(), "operator notifications enabled.");
    } else {
        info!("operator notifications disabled (set HELPDESK_OPERATOR=true to enable).");
    }

    let probe = Arc::new(HttpProbe::with_default_urls(reqwest::Client::new()));
    let terminal = Terminal::new(session.clone(), probe);

    match session.load_history().await {
        HistoryOutcome::Replayed(count) => info!(count, "chat restored."),
        HistoryOutcome::Empty => info!("new chat."),
        HistoryOutcome::Failed => warn!("chat history unavailable."),
    }
    terminal.flush().await;
    terminal.print_quick_replies().await;
    println!("Type a message, or /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{err:#}");
                continue;
            }
        };

        match terminal.handle(command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(source) => {
                error!(?source, "command failed");
                println!("{source:#}");
            }
        }
    }

    info!("bye.");
    Ok(())
}

fn spawn_badge_logger(poller: NotificationPoller) {
    let mut badge = poller.subscribe();
    poller.spawn();

    tokio::spawn(async move {
        while badge.changed().await.is_ok() {
            let current = badge.borrow_and_update().clone();
            if current.visible {
                info!(unread = %current.text, "unread notifications.");
            } else {
                info!("no unread notifications.");
            }
        }
    });
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}
