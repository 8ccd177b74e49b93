use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::error::StoreError;
use crate::models::date_key::DateKey;
use crate::models::day::{DayEntry, DayRecord, HistoricalFact, Note, NoteId};
use crate::store::DayStore;

pub type SharedStore = Arc<Mutex<DayStore>>;

/// Text-keyed operations over the shared store. Each call holds the store
/// lock for its whole duration, so writes to a date never interleave.
#[derive(Clone)]
pub struct DayService {
    store: SharedStore,
}

impl DayService {
    pub fn new(store: DayStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub fn from_shared(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn shared(&self) -> SharedStore {
        self.store.clone()
    }

    pub async fn get_day_data(&self, date: &str) -> Result<Option<DayRecord>, StoreError> {
        let key: DateKey = date.parse()?;
        let store = self.store.lock().await;
        Ok(store.get_day(&key))
    }

    pub async fn get_month_data(&self, year: i32, month: u32) -> Result<Vec<DayEntry>, StoreError> {
        let store = self.store.lock().await;
        store.get_month(year, month)
    }

    pub async fn add_note(&self, date: &str, content: &str) -> Result<Note, StoreError> {
        let key: DateKey = date.parse()?;
        let mut store = self.store.lock().await;
        let note = store.add_note(key, content)?;
        info!("Note {} added to {}", note.id, key);
        Ok(note)
    }

    pub async fn complete_note(&self, date: &str, note_id: NoteId) -> Result<(), StoreError> {
        let key: DateKey = date.parse()?;
        let mut store = self.store.lock().await;
        if store.complete_note(&key, note_id)? {
            info!("Note {} on {} completed", note_id, key);
        }
        Ok(())
    }

    pub async fn store_on_this_day(
        &self,
        date: &str,
        title: &str,
        year: i64,
        wiki_link: &str,
    ) -> Result<(), StoreError> {
        let key: DateKey = date.parse()?;
        let fact = HistoricalFact {
            title: title.to_string(),
            wiki_link: wiki_link.to_string(),
            year,
        };
        let mut store = self.store.lock().await;
        store.store_historical_fact(key, fact)?;
        info!("On-this-day fact stored for {}", key);
        Ok(())
    }
}
