use async_trait::async_trait;
use futures::future::select_all;
use reqwest::header::CACHE_CONTROL;
use tracing::debug;

pub const DEFAULT_PROBE_URLS: [&str; 3] = [
    "https://speed.cloudflare.com/__down?bytes=1000000",
    "https://www.google.com/images/branding/googlelogo/2x/googlelogo_color_272x92dp.png",
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css",
];

/// Decides when the simulated test may stop waiting. Nothing is measured.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// True when the first probe to settle succeeded.
    async fn probe(&self) -> bool;
}

/// Races GET requests to a few public URLs; the first to settle wins.
#[derive(Clone, Debug)]
pub struct HttpProbe {
    http: reqwest::Client,
    urls: Vec<String>,
}

impl HttpProbe {
    pub fn new(http: reqwest::Client, urls: Vec<String>) -> Self {
        Self { http, urls }
    }

    pub fn with_default_urls(http: reqwest::Client) -> Self {
        Self::new(
            http,
            DEFAULT_PROBE_URLS.iter().map(|url| (*url).to_owned()).collect(),
        )
    }
}

#[async_trait]
impl LivenessProbe for HttpProbe {
    async fn probe(&self) -> bool {
        if self.urls.is_empty() {
            return false;
        }

        let requests = self.urls.iter().map(|url| {
            Box::pin(async move {
                self.http
                    .get(url)
                    .header(CACHE_CONTROL, "no-store")
                    .send()
                    .await
                    .map(|_| url.as_str())
            })
        });

        let (first, _, _) = select_all(requests).await;
        match first {
            Ok(url) => {
                debug!(url, "speed test probe settled");
                true
            }
            Err(source) => {
                debug!(?source, "speed test probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;

    use super::{HttpProbe, LivenessProbe};

    #[tokio::test]
    async fn any_response_counts_as_alive() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let probe = HttpProbe::new(reqwest::Client::new(), vec![server.url("/missing")]);
        assert!(probe.probe().await);
    }

    #[tokio::test]
    async fn first_settled_probe_decides() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_secs(2));
        });

        let probe = HttpProbe::new(
            reqwest::Client::new(),
            vec![server.url("/slow"), "http://127.0.0.1:9/".to_owned()],
        );
        assert!(!probe.probe().await);
    }

    #[tokio::test]
    async fn no_urls_means_not_alive() {
        let probe = HttpProbe::new(reqwest::Client::new(), Vec::new());
        assert!(!probe.probe().await);
    }
}
