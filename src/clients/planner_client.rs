use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::handlers::api::{AddNoteRequest, ErrorMessage, NO_RECORD_PREFIX, StoreOnThisDayRequest};
use crate::models::date_key::DateKey;
use crate::models::day::{DayEntry, DayRecord, HistoricalFact, Note, NoteId};
use crate::service::day_service::DayService;

/// The Day Store operations as seen by a client.
#[async_trait]
pub trait PlannerBackend: Send + Sync {
    async fn get_day_data(&self, date: &DateKey) -> Result<Option<DayRecord>, ClientError>;

    async fn get_month_data(&self, year: i32, month: u32) -> Result<Vec<DayEntry>, ClientError>;

    async fn add_note(&self, date: &DateKey, content: &str) -> Result<Note, ClientError>;

    async fn complete_note(&self, date: &DateKey, note_id: NoteId) -> Result<(), ClientError>;

    async fn store_on_this_day(
        &self,
        date: &DateKey,
        fact: &HistoricalFact,
    ) -> Result<(), ClientError>;
}

/// Talks to a running day store over HTTP.
pub struct HttpPlannerBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPlannerBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn day_url(&self, date: &DateKey) -> String {
        format!("{}/api/days/{}", self.base_url, date)
    }

    pub fn month_url(&self, year: i32, month: u32) -> String {
        format!("{}/api/months/{}/{}", self.base_url, year, month)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await?;
        let body = serde_json::from_str::<ErrorMessage>(&text)
            .map(|message| message.error)
            .unwrap_or(text);
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ClientError::Decode(format!("{}\nRaw body: {}", e, text)))
    }
}

#[async_trait]
impl PlannerBackend for HttpPlannerBackend {
    async fn get_day_data(&self, date: &DateKey) -> Result<Option<DayRecord>, ClientError> {
        let response = self.client.get(self.day_url(date)).send().await?;
        match Self::check(response).await {
            Ok(response) => Ok(Some(Self::decode(response).await?)),
            // Only the store's own "no record" reply means absent; any other
            // 404 is a misrouted request.
            Err(ClientError::Status { status: 404, body }) if body.starts_with(NO_RECORD_PREFIX) => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn get_month_data(&self, year: i32, month: u32) -> Result<Vec<DayEntry>, ClientError> {
        let response = self.client.get(self.month_url(year, month)).send().await?;
        let response = Self::check(response).await?;
        Self::decode(response).await
    }

    async fn add_note(&self, date: &DateKey, content: &str) -> Result<Note, ClientError> {
        let response = self
            .client
            .post(format!("{}/notes", self.day_url(date)))
            .json(&AddNoteRequest {
                content: content.to_string(),
            })
            .send()
            .await?;
        let response = Self::check(response).await?;
        Self::decode(response).await
    }

    async fn complete_note(&self, date: &DateKey, note_id: NoteId) -> Result<(), ClientError> {
        let response = self
            .client
            .post(format!("{}/notes/{}/complete", self.day_url(date), note_id))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn store_on_this_day(
        &self,
        date: &DateKey,
        fact: &HistoricalFact,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .put(format!("{}/on-this-day", self.day_url(date)))
            .json(&StoreOnThisDayRequest {
                title: fact.title.clone(),
                year: fact.year,
                wiki_link: fact.wiki_link.clone(),
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Calls the store in-process, for the CLI without a server and for tests.
#[derive(Clone)]
pub struct LocalPlannerBackend {
    service: DayService,
}

impl LocalPlannerBackend {
    pub fn new(service: DayService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl PlannerBackend for LocalPlannerBackend {
    async fn get_day_data(&self, date: &DateKey) -> Result<Option<DayRecord>, ClientError> {
        Ok(self.service.get_day_data(&date.to_string()).await?)
    }

    async fn get_month_data(&self, year: i32, month: u32) -> Result<Vec<DayEntry>, ClientError> {
        Ok(self.service.get_month_data(year, month).await?)
    }

    async fn add_note(&self, date: &DateKey, content: &str) -> Result<Note, ClientError> {
        Ok(self.service.add_note(&date.to_string(), content).await?)
    }

    async fn complete_note(&self, date: &DateKey, note_id: NoteId) -> Result<(), ClientError> {
        Ok(self.service.complete_note(&date.to_string(), note_id).await?)
    }

    async fn store_on_this_day(
        &self,
        date: &DateKey,
        fact: &HistoricalFact,
    ) -> Result<(), ClientError> {
        Ok(self
            .service
            .store_on_this_day(&date.to_string(), &fact.title, fact.year, &fact.wiki_link)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_use_unpadded_date_keys() {
        let backend = HttpPlannerBackend::new("http://localhost:4943/");
        let date: DateKey = "2024-03-05".parse().unwrap();
        assert_eq!(backend.day_url(&date), "http://localhost:4943/api/days/2024-3-5");
        assert_eq!(backend.month_url(2024, 3), "http://localhost:4943/api/months/2024/3");
    }
}
