use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, warn};

use super::calendar::{self, CalendarState};
use crate::clients::on_this_day::OnThisDayClient;
use crate::clients::planner_client::PlannerBackend;
use crate::error::ClientError;
use crate::models::date_key::DateKey;
use crate::models::day::NoteId;

pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";
pub const PAST_DAY_MESSAGE: &str = "Past days cannot be opened.";

/// Drives the calendar: every action calls the backend, then reloads the
/// state the view renders from.
pub struct CalendarController {
    backend: Arc<dyn PlannerBackend>,
    facts: Arc<dyn OnThisDayClient>,
    state: CalendarState,
}

impl CalendarController {
    pub fn new(
        backend: Arc<dyn PlannerBackend>,
        facts: Arc<dyn OnThisDayClient>,
        today: NaiveDate,
    ) -> Self {
        Self {
            backend,
            facts,
            state: CalendarState::new(today),
        }
    }

    pub fn state(&self) -> &CalendarState {
        &self.state
    }

    pub fn render(&self) -> String {
        calendar::render(&self.state)
    }

    pub async fn load_month(&mut self) {
        match self
            .backend
            .get_month_data(self.state.year, self.state.month)
            .await
        {
            Ok(entries) => self.state.set_month_data(entries),
            Err(err) => self.fail("loading month", err),
        }
    }

    /// Jumps to the given month. Returns `false` for an invalid month.
    pub async fn show_month(&mut self, year: i32, month: u32) -> bool {
        self.state.message = None;
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return false;
        }
        self.state.year = year;
        self.state.month = month;
        self.state.month_data.clear();
        self.load_month().await;
        true
    }

    pub async fn next_month(&mut self) {
        self.state.message = None;
        self.state.shift_month(true);
        self.load_month().await;
    }

    pub async fn previous_month(&mut self) {
        self.state.message = None;
        self.state.shift_month(false);
        self.load_month().await;
    }

    /// Opens the detail panel for a day of the displayed month. Returns
    /// `false` for past days and days outside the month.
    pub async fn select_day(&mut self, day: u32) -> bool {
        self.state.message = None;
        let Ok(date) = DateKey::from_ymd(self.state.year, self.state.month, day) else {
            return false;
        };
        if self.state.is_past(date.date()) {
            self.state.message = Some(PAST_DAY_MESSAGE.to_string());
            return false;
        }
        self.state.selected = Some(date);
        self.state.detail = None;
        self.load_detail().await;
        true
    }

    pub fn close_day(&mut self) {
        self.state.selected = None;
        self.state.detail = None;
        self.state.message = None;
    }

    pub async fn add_note(&mut self, content: &str) {
        self.state.message = None;
        let Some(date) = self.state.selected else {
            return;
        };
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        match self.backend.add_note(&date, content).await {
            Ok(note) => debug!("Added note {} on {}", note.id, date),
            Err(err) => return self.fail("adding note", err),
        }
        self.refresh().await;
    }

    pub async fn complete_note(&mut self, note_id: NoteId) {
        self.state.message = None;
        let Some(date) = self.state.selected else {
            return;
        };
        if let Err(err) = self.backend.complete_note(&date, note_id).await {
            return self.fail("completing note", err);
        }
        self.refresh().await;
    }

    /// Fetches the on-this-day fact for the selected day and stores it.
    /// Feed failures and empty feeds leave the state untouched.
    pub async fn request_fact(&mut self) {
        self.state.message = None;
        let Some(date) = self.state.selected else {
            return;
        };
        let fact = match self.facts.fetch_fact(date.month(), date.day()).await {
            Ok(Some(fact)) => fact,
            Ok(None) => {
                debug!("No on-this-day data for {}", date);
                return;
            }
            Err(err) => {
                warn!("Error fetching on-this-day data for {}: {}", date, err);
                return;
            }
        };
        if let Err(err) = self.backend.store_on_this_day(&date, &fact).await {
            return self.fail("storing on-this-day fact", err);
        }
        self.refresh().await;
    }

    async fn load_detail(&mut self) {
        let Some(date) = self.state.selected else {
            return;
        };
        match self.backend.get_day_data(&date).await {
            Ok(record) => self.state.detail = Some(record.unwrap_or_default()),
            Err(err) => self.fail("loading day", err),
        }
    }

    async fn refresh(&mut self) {
        self.load_detail().await;
        self.load_month().await;
    }

    fn fail(&mut self, action: &str, err: ClientError) {
        error!("Error {}: {}", action, err);
        self.state.message = Some(GENERIC_ERROR.to_string());
    }
}
