use reqwest::Client;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::config::Config;
use crate::error::Result;
use crate::models::{DocumentRecords, MergedDataset};
use crate::scrapers::{discover_links, extract_records, Selectors};
use crate::utils::http::{create_client, fetch_document, fetch_documents};

mod merge;
mod normalize;

pub use merge::merge_documents;
pub use normalize::normalize_records;

/// Extract and normalize a single document.
pub fn parse_document(html: &str, source: &str, selectors: &Selectors) -> DocumentRecords {
    let records = extract_records(html, selectors);
    normalize_records(source, &records)
}

/// Fetches a main page and its detail pages, then merges everything into one dataset.
pub struct Pipeline {
    client: Client,
    selectors: Selectors,
    concurrency: usize,
    detail_deadline: Option<Duration>,
    follow_links: bool,
}

impl Pipeline {
    pub fn new(config: &Config) -> Result<Self> {
        let client = create_client(config)?;
        Self::with_client(client, config)
    }

    pub fn with_client(client: Client, config: &Config) -> Result<Self> {
        Ok(Self {
            client,
            selectors: config.selectors.compile()?,
            concurrency: config.concurrency.max(1),
            detail_deadline: config.detail_deadline_seconds.map(Duration::from_secs),
            follow_links: config.follow_links,
        })
    }

    /// Run against a live URL. Only a failure to fetch the main document is an error.
    pub async fn run(&self, url: &str) -> Result<MergedDataset> {
        let url = Url::parse(url)?;
        info!("Fetching main document {}", url);

        let html = fetch_document(&self.client, &url).await?;
        Ok(self.run_with_html(&html, &url).await)
    }

    /// Run with an already retrieved main document; detail pages are still fetched live.
    pub async fn run_with_html(&self, html: &str, base_url: &Url) -> MergedDataset {
        let main = parse_document(html, base_url.as_str(), &self.selectors);
        info!(
            "Main document: {} students, {} classes, {} grades",
            main.students.len(),
            main.classes.len(),
            main.grades.len()
        );

        let links = if self.follow_links {
            self.detail_links(html, base_url)
        } else {
            Vec::new()
        };

        let mut documents = vec![main];

        if !links.is_empty() {
            let requested = links.len();
            info!("Fetching {} detail pages ({} at a time)", requested, self.concurrency);

            let pages = fetch_documents(&self.client, links, self.concurrency, self.detail_deadline).await;
            info!("Fetched {} of {} detail pages", pages.len(), requested);

            for (url, body) in pages {
                documents.push(parse_document(&body, url.as_str(), &self.selectors));
            }
        }

        let merged = merge_documents(&documents);
        info!(
            "Merged {} documents into {} students, {} classes, {} grades",
            documents.len(),
            merged.students.len(),
            merged.classes.len(),
            merged.grades.len()
        );

        merged
    }

    fn detail_links(&self, html: &str, base_url: &Url) -> Vec<Url> {
        let mut own_url = base_url.clone();
        own_url.set_fragment(None);

        let links: Vec<Url> = discover_links(html, base_url, &self.selectors)
            .into_iter()
            .filter(|link| *link != own_url)
            .collect();

        info!("Discovered {} detail links", links.len());
        links
    }
}
