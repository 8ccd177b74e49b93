use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{Datelike, Months, NaiveDate};

use crate::models::date_key::DateKey;
use crate::models::day::{DayEntry, DayRecord};

pub const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const CELL_WIDTH: usize = 8;

/// Everything the calendar renders from. Owned by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarState {
    pub year: i32,
    pub month: u32,
    pub today: NaiveDate,
    pub month_data: BTreeMap<u32, DayRecord>,
    pub selected: Option<DateKey>,
    pub detail: Option<DayRecord>,
    pub message: Option<String>,
}

impl CalendarState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            year: today.year(),
            month: today.month(),
            today,
            month_data: BTreeMap::new(),
            selected: None,
            detail: None,
            message: None,
        }
    }

    pub fn first_of_month(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(self.today)
    }

    pub fn shift_month(&mut self, forward: bool) {
        let first = self.first_of_month();
        let shifted = if forward {
            first.checked_add_months(Months::new(1))
        } else {
            first.checked_sub_months(Months::new(1))
        };
        if let Some(date) = shifted {
            self.year = date.year();
            self.month = date.month();
            self.month_data.clear();
        }
    }

    pub fn set_month_data(&mut self, entries: Vec<DayEntry>) {
        self.month_data = entries
            .into_iter()
            .filter(|entry| entry.date.year() == self.year && entry.date.month() == self.month)
            .map(|entry| (entry.date.day(), entry.record))
            .collect();
    }

    pub fn is_past(&self, date: NaiveDate) -> bool {
        date < self.today
    }

    pub fn grid(&self) -> MonthGrid {
        let first = self.first_of_month();
        let mut cells: Vec<Option<DayCell>> =
            vec![None; first.weekday().num_days_from_sunday() as usize];
        for day in 1..=days_in_month(self.year, self.month) {
            let Some(date) = NaiveDate::from_ymd_opt(self.year, self.month, day) else {
                continue;
            };
            cells.push(Some(DayCell {
                day,
                is_today: date == self.today,
                is_past: self.is_past(date),
                open_notes: self
                    .month_data
                    .get(&day)
                    .map(DayRecord::open_notes)
                    .unwrap_or(0),
            }));
        }
        MonthGrid {
            year: self.year,
            month: self.month,
            cells,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    pub is_today: bool,
    pub is_past: bool,
    pub open_notes: usize,
}

/// Month laid out Sunday-first; `None` cells pad the first week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<Option<DayCell>>,
}

impl MonthGrid {
    pub fn weeks(&self) -> impl Iterator<Item = &[Option<DayCell>]> {
        self.cells.chunks(7)
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(0)
}

pub fn render(state: &CalendarState) -> String {
    let mut out = render_grid(state);
    if let Some(selected) = state.selected {
        out.push('\n');
        let empty = DayRecord::default();
        let record = state.detail.as_ref().unwrap_or(&empty);
        out.push_str(&render_detail(selected, record));
    }
    if let Some(message) = &state.message {
        let _ = writeln!(out, "\n! {}", message);
    }
    out
}

// Cell legend: `*` today, `.` past, `(n)` open notes.
pub fn render_grid(state: &CalendarState) -> String {
    let grid = state.grid();
    let mut out = String::new();
    let _ = writeln!(out, "{}", state.first_of_month().format("%B %Y"));
    for weekday in WEEKDAYS {
        let _ = write!(out, "{:<width$}", weekday, width = CELL_WIDTH);
    }
    out.truncate(out.trim_end().len());
    out.push('\n');
    for week in grid.weeks() {
        let mut line = String::new();
        for cell in week {
            let text = match cell {
                Some(cell) => render_cell(cell),
                None => String::new(),
            };
            let _ = write!(line, "{:<width$}", text, width = CELL_WIDTH);
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}

fn render_cell(cell: &DayCell) -> String {
    let marker = if cell.is_today {
        "*"
    } else if cell.is_past {
        "."
    } else {
        ""
    };
    let badge = if cell.open_notes > 0 {
        format!("({})", cell.open_notes)
    } else {
        String::new()
    };
    format!("{}{}{}", cell.day, marker, badge)
}

pub fn render_detail(date: DateKey, record: &DayRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", date.date().format("%A, %B %-d, %Y"));
    let _ = writeln!(out, "On This Day");
    match &record.on_this_day {
        Some(fact) => {
            let _ = writeln!(out, "  {} ({})", fact.title, fact.year);
            let _ = writeln!(out, "  Read more: {}", fact.wiki_link);
        }
        None => {
            let _ = writeln!(out, "  [request data]");
        }
    }
    let _ = writeln!(out, "Notes");
    if record.notes.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for note in &record.notes {
        let mark = if note.is_completed { "x" } else { " " };
        let _ = writeln!(out, "  [{}] #{} {}", mark, note.id, note.content);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::day::HistoricalFact;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 13), 0);
    }

    #[test]
    fn grid_pads_to_first_weekday() {
        // 2024-03-01 is a Friday.
        let state = CalendarState::new(date(2024, 3, 10));
        let grid = state.grid();
        assert_eq!(grid.cells.iter().take_while(|c| c.is_none()).count(), 5);
        assert_eq!(grid.cells.iter().filter(|c| c.is_some()).count(), 31);
        assert_eq!(grid.weeks().count(), 6);
    }

    #[test]
    fn grid_marks_today_past_and_open_notes() {
        let mut state = CalendarState::new(date(2024, 3, 10));
        let mut record = DayRecord::default();
        record.add_note("a");
        let done = record.add_note("b");
        record.add_note("c");
        record.complete_note(done.id);
        state.set_month_data(vec![DayEntry {
            date: "2024-3-12".parse().unwrap(),
            record,
        }]);

        let cells: Vec<DayCell> = state.grid().cells.into_iter().flatten().collect();
        assert!(cells[8].is_past && !cells[8].is_today);
        assert!(cells[9].is_today && !cells[9].is_past);
        assert!(!cells[10].is_past);
        assert_eq!(cells[11].open_notes, 2);
        assert_eq!(cells[12].open_notes, 0);
    }

    #[test]
    fn set_month_data_ignores_other_months() {
        let mut state = CalendarState::new(date(2024, 3, 10));
        let mut record = DayRecord::default();
        record.add_note("a");
        state.set_month_data(vec![DayEntry {
            date: "2024-4-12".parse().unwrap(),
            record,
        }]);
        assert!(state.month_data.is_empty());
    }

    #[test]
    fn shift_month_wraps_years() {
        let mut state = CalendarState::new(date(2024, 12, 31));
        state.shift_month(true);
        assert_eq!((state.year, state.month), (2025, 1));
        state.shift_month(false);
        state.shift_month(false);
        assert_eq!((state.year, state.month), (2024, 11));
    }

    #[test]
    fn render_grid_shows_header_and_badges() {
        let mut state = CalendarState::new(date(2024, 3, 10));
        let mut record = DayRecord::default();
        record.add_note("a");
        state.set_month_data(vec![DayEntry {
            date: "2024-3-15".parse().unwrap(),
            record,
        }]);

        let text = render_grid(&state);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "March 2024");
        assert!(lines[1].starts_with("Sun     Mon"));
        assert!(lines[1].ends_with("Sat"));
        assert!(lines[2].ends_with("1.      2."));
        assert!(text.contains("10*"));
        assert!(text.contains("9."));
        assert!(text.contains("15(1)"));
    }

    #[test]
    fn render_detail_lists_notes_and_fact() {
        let mut record = DayRecord::default();
        let first = record.add_note("n1");
        record.add_note("n2");
        record.complete_note(first.id);

        let text = render_detail("2024-3-15".parse().unwrap(), &record);
        assert!(text.starts_with("Friday, March 15, 2024"));
        assert!(text.contains("[request data]"));
        assert!(text.contains("[x] #0 n1"));
        assert!(text.contains("[ ] #1 n2"));

        record.on_this_day = Some(HistoricalFact {
            title: "Something".to_string(),
            wiki_link: "https://en.wikipedia.org/wiki/Something".to_string(),
            year: 1901,
        });
        let text = render_detail("2024-3-15".parse().unwrap(), &record);
        assert!(text.contains("Something (1901)"));
        assert!(text.contains("Read more: https://en.wikipedia.org/wiki/Something"));
        assert!(!text.contains("[request data]"));
    }

    #[test]
    fn render_includes_detail_only_when_selected() {
        let mut state = CalendarState::new(date(2024, 3, 10));
        assert!(!render(&state).contains("Notes"));
        state.selected = Some("2024-3-15".parse().unwrap());
        let text = render(&state);
        assert!(text.contains("Notes"));
        assert!(text.contains("(none)"));
    }
}
