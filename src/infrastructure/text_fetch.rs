//! Plain-text GET for the network page.

use crate::error::FetchError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub const DEMO_URL: &str = "https://www.rfc-editor.org/rfc/rfc862.txt";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TextFetcher {
    client: Client,
}

impl TextFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(CONNECT_TIMEOUT + READ_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        info!("--> GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        info!("<-- {} {}", status.as_u16(), url);

        if status != StatusCode::OK {
            return Err(FetchError::Http(status.as_u16()));
        }
        let body = response.text().await?;
        Ok(normalize_lines(&body))
    }
}

/// Every line terminated by a single `\n`, CRLF included.
pub fn normalize_lines(body: &str) -> String {
    body.lines().fold(String::with_capacity(body.len()), |mut out, line| {
        out.push_str(line);
        out.push('\n');
        out
    })
}

/// Serve fetch requests one at a time until the request channel closes.
pub async fn run_text_worker(
    mut requests: mpsc::UnboundedReceiver<String>,
    results: mpsc::UnboundedSender<Result<String, String>>,
) {
    let fetcher = match TextFetcher::new() {
        Ok(fetcher) => fetcher,
        Err(e) => {
            warn!("HTTP client unavailable: {}", e);
            while requests.recv().await.is_some() {
                let _ = results.send(Err(e.to_string()));
            }
            return;
        }
    };

    while let Some(url) = requests.recv().await {
        let result = fetcher.fetch_text(&url).await.map_err(|e| {
            warn!("Fetching {} failed: {}", url, e);
            e.to_string()
        });
        let _ = results.send(result);
    }
}
