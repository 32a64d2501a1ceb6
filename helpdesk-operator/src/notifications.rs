use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error};

use helpdesk_client::HelpdeskClient;
use helpdesk_utils::formatting::badge_text;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Unread-notification badge as shown in the operator navbar.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Badge {
    pub visible: bool,
    pub text: String,
}

impl Badge {
    pub fn for_count(count: u64) -> Self {
        if count == 0 {
            return Self::default();
        }

        Self {
            visible: true,
            text: badge_text(count),
        }
    }
}

/// Polls the unread-count endpoint and publishes the badge on a watch channel.
#[derive(Debug)]
pub struct NotificationPoller {
    client: HelpdeskClient,
    period: Duration,
    badge: watch::Sender<Badge>,
}

impl NotificationPoller {
    pub fn new(client: HelpdeskClient, period: Duration) -> Self {
        let (badge, _) = watch::channel(Badge::default());
        Self {
            client,
            period,
            badge,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Badge> {
        self.badge.subscribe()
    }

    pub fn badge(&self) -> Badge {
        self.badge.borrow().clone()
    }

    /// Run one poll. Returns the new badge, or `None` when the badge was left
    /// untouched because the request failed.
    pub async fn poll_once(&self) -> Option<Badge> {
        match self.client.unread_notifications().await {
            Ok(summary) => {
                let badge = Badge::for_count(summary.unread_count);
                self.badge.send_if_modified(|current| {
                    if *current == badge {
                        return false;
                    }
                    *current = badge.clone();
                    true
                });
                Some(badge)
            }
            Err(source) if source.is_status() => {
                debug!(?source, "notification poll rejected");
                None
            }
            Err(source) => {
                error!(?source, "failed to fetch operator notifications");
                None
            }
        }
    }

    /// Poll now and then every period until the task is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                self.poll_once().await;
            }
        })
    }
}
