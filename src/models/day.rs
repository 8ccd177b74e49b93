use serde::{Deserialize, Serialize};

use super::date_key::DateKey;

pub type NoteId = u64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    pub is_completed: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalFact {
    pub title: String,
    pub wiki_link: String,
    pub year: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub notes: Vec<Note>,
    #[serde(default)]
    pub on_this_day: Option<HistoricalFact>,
}

impl DayRecord {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.on_this_day.is_none()
    }

    pub fn open_notes(&self) -> usize {
        self.notes.iter().filter(|note| !note.is_completed).count()
    }

    // Ids are never reused because notes are never removed.
    pub fn add_note(&mut self, content: &str) -> Note {
        let id = self.notes.iter().map(|note| note.id + 1).max().unwrap_or(0);
        let note = Note {
            id,
            content: content.to_string(),
            is_completed: false,
        };
        self.notes.push(note.clone());
        note
    }

    /// Marks the note complete. Returns `false` when no note has that id.
    pub fn complete_note(&mut self, id: NoteId) -> bool {
        match self.notes.iter_mut().find(|note| note.id == id) {
            Some(note) => {
                note.is_completed = true;
                true
            }
            None => false,
        }
    }
}

/// One entry of a month listing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub date: DateKey,
    pub record: DayRecord,
}
