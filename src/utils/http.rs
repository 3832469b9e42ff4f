use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::{IngestError, Result};

/// Build the single client shared by the main and detail fetches of a run.
pub fn create_client(config: &Config) -> Result<Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| IngestError::Header {
            name: name.clone(),
            message: e.to_string(),
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| IngestError::Header {
            name: name.clone(),
            message: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }

    let client = ClientBuilder::new()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .pool_max_idle_per_host(config.concurrency)
        .build()?;

    Ok(client)
}

/// Fetch one document. Transport errors and non-success statuses are errors; nothing is retried.
pub async fn fetch_document(client: &Client, url: &Url) -> Result<String> {
    let response = client.get(url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        warn!("HTTP error {}: {}", status, url);
        return Err(IngestError::Status {
            url: url.to_string(),
            status,
        });
    }

    Ok(response.text().await?)
}

/// Fetch many documents with at most `concurrency` requests in flight.
///
/// Failed fetches are logged and skipped. Successful pages are returned in completion
/// order. With a `deadline`, pages still pending when it expires are skipped as well.
pub async fn fetch_documents(
    client: &Client,
    urls: Vec<Url>,
    concurrency: usize,
    deadline: Option<Duration>,
) -> Vec<(Url, String)> {
    let total = urls.len();
    let mut pages = Vec::with_capacity(total);
    let mut failed = 0usize;

    let mut responses = stream::iter(urls)
        .map(|url| async move {
            let result = fetch_document(client, &url).await;
            (url, result)
        })
        .buffer_unordered(concurrency.max(1));

    let collect = async {
        while let Some((url, result)) = responses.next().await {
            match result {
                Ok(body) => {
                    debug!("Fetched detail page {}", url);
                    pages.push((url, body));
                }
                Err(e) => {
                    warn!("Skipping detail page {}: {}", url, e);
                    failed += 1;
                }
            }
        }
    };

    let finished = match deadline {
        Some(limit) => tokio::time::timeout(limit, collect).await.is_ok(),
        None => {
            collect.await;
            true
        }
    };

    if !finished {
        warn!(
            "Detail page deadline reached with {} of {} pages pending",
            total - pages.len() - failed,
            total
        );
    }

    pages
}
