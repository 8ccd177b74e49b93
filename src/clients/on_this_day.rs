use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;
use crate::models::day::HistoricalFact;

const USER_AGENT: &str = concat!("dayPlanner/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize, Default)]
pub struct OnThisDayFeed {
    #[serde(default)]
    pub selected: Vec<SelectedEvent>,
}

#[derive(Debug, Deserialize)]
pub struct SelectedEvent {
    pub text: String,
    pub year: i64,
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    pub content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
pub struct ContentUrls {
    pub desktop: Option<PageUrl>,
}

#[derive(Debug, Deserialize)]
pub struct PageUrl {
    pub page: String,
}

impl OnThisDayFeed {
    /// First selected event as a fact. Events without a page link count as
    /// no data.
    pub fn first_fact(&self) -> Option<HistoricalFact> {
        let event = self.selected.first()?;
        let link = event
            .pages
            .first()?
            .content_urls
            .as_ref()?
            .desktop
            .as_ref()?
            .page
            .clone();
        Some(HistoricalFact {
            title: event.text.clone(),
            wiki_link: link,
            year: event.year,
        })
    }
}

#[async_trait]
pub trait OnThisDayClient: Send + Sync {
    /// `Ok(None)` when the feed has nothing usable for the date.
    async fn fetch_fact(&self, month: u32, day: u32) -> Result<Option<HistoricalFact>, ClientError>;
}

pub struct WikimediaClient {
    client: reqwest::Client,
    base_url: String,
}

impl WikimediaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn feed_url(&self, month: u32, day: u32) -> String {
        format!("{}/{:02}/{:02}", self.base_url, month, day)
    }
}

#[async_trait]
impl OnThisDayClient for WikimediaClient {
    async fn fetch_fact(&self, month: u32, day: u32) -> Result<Option<HistoricalFact>, ClientError> {
        let url = self.feed_url(month, day);
        debug!("Fetching on-this-day feed from {}", url);
        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let feed: OnThisDayFeed = serde_json::from_str(&text)
            .map_err(|e| ClientError::Decode(format!("{}\nRaw body: {}", e, text)))?;
        Ok(feed.first_fact())
    }
}
