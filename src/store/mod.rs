pub mod db;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::date_key::DateKey;
use crate::models::day::{DayEntry, DayRecord, HistoricalFact, Note, NoteId};
use db::DB;

/// What `store_historical_fact` does when the day already has a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FactPolicy {
    #[default]
    Overwrite,
    KeepFirst,
}

impl FromStr for FactPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(FactPolicy::Overwrite),
            "keep-first" | "keep_first" => Ok(FactPolicy::KeepFirst),
            other => Err(format!("Unknown fact policy {}", other)),
        }
    }
}

impl fmt::Display for FactPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactPolicy::Overwrite => write!(f, "overwrite"),
            FactPolicy::KeepFirst => write!(f, "keep-first"),
        }
    }
}

/// Map from date to day record, optionally backed by a JSON snapshot.
#[derive(Debug)]
pub struct DayStore {
    days: DB,
    location: Option<PathBuf>,
    fact_policy: FactPolicy,
}

impl DayStore {
    pub fn in_memory() -> Self {
        Self {
            days: DB::new(),
            location: None,
            fact_policy: FactPolicy::default(),
        }
    }

    pub fn open(location: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            days: db::load_db(location)?,
            location: Some(location.to_path_buf()),
            fact_policy: FactPolicy::default(),
        })
    }

    pub fn with_fact_policy(mut self, fact_policy: FactPolicy) -> Self {
        self.fact_policy = fact_policy;
        self
    }

    pub fn fact_policy(&self) -> FactPolicy {
        self.fact_policy
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn get_day(&self, date: &DateKey) -> Option<DayRecord> {
        self.days
            .get(date)
            .filter(|record| !record.is_empty())
            .cloned()
    }

    pub fn get_month(&self, year: i32, month: u32) -> Result<Vec<DayEntry>, StoreError> {
        let first = DateKey::from_ymd(year, month, 1)
            .map_err(|_| StoreError::InvalidMonth { year, month })?;
        let entries = self
            .days
            .range(first..)
            .take_while(|(date, _)| date.year() == year && date.month() == month)
            .filter(|(_, record)| !record.is_empty())
            .map(|(date, record)| DayEntry {
                date: *date,
                record: record.clone(),
            })
            .collect();
        Ok(entries)
    }

    pub fn add_note(&mut self, date: DateKey, content: &str) -> Result<Note, StoreError> {
        let previous = self.days.get(&date).cloned();
        let note = self.days.entry(date).or_default().add_note(content);
        self.commit(date, previous)?;
        debug!("Added note {} to {}", note.id, date);
        Ok(note)
    }

    /// Unknown days and ids are a no-op. Returns whether a note matched.
    pub fn complete_note(&mut self, date: &DateKey, id: NoteId) -> Result<bool, StoreError> {
        let previous = self.days.get(date).cloned();
        let found = self
            .days
            .get_mut(date)
            .map(|record| record.complete_note(id))
            .unwrap_or(false);
        if !found {
            warn!("No note {} on {}, nothing to complete", id, date);
            return Ok(false);
        }
        self.commit(*date, previous)?;
        debug!("Completed note {} on {}", id, date);
        Ok(true)
    }

    pub fn store_historical_fact(
        &mut self,
        date: DateKey,
        fact: HistoricalFact,
    ) -> Result<(), StoreError> {
        let has_fact = self
            .days
            .get(&date)
            .is_some_and(|record| record.on_this_day.is_some());
        if has_fact && self.fact_policy == FactPolicy::KeepFirst {
            return Err(StoreError::FactAlreadyStored(date));
        }
        let previous = self.days.get(&date).cloned();
        self.days.entry(date).or_default().on_this_day = Some(fact);
        self.commit(date, previous)?;
        debug!("Stored on-this-day fact for {}", date);
        Ok(())
    }

    /// Persists a mutation of `date`. On failure the record goes back to
    /// `previous`, so memory never holds what the snapshot does not.
    fn commit(&mut self, date: DateKey, previous: Option<DayRecord>) -> Result<(), StoreError> {
        let Err(err) = self.persist() else {
            return Ok(());
        };
        warn!("Failed to persist change to {}, rolling back: {}", date, err);
        match previous {
            Some(record) => {
                self.days.insert(date, record);
            }
            None => {
                self.days.remove(&date);
            }
        }
        Err(err)
    }

    fn persist(&self) -> Result<(), StoreError> {
        match &self.location {
            Some(location) => db::save_db(location, &self.days),
            None => Ok(()),
        }
    }
}
