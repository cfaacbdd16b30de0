use crate::model::{format_date, AttendanceRecord};
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Date string (`YYYY-MM-DD`) to record, for one student and one month.
pub type AttendanceData = BTreeMap<String, AttendanceRecord>;

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => 30,
    }
}

/// The month being viewed. Always anchored on the 1st so that stepping
/// from the 31st never overflows into the month after next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthCursor {
    first: NaiveDate,
}

impl MonthCursor {
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    /// Accepts `YYYY-MM` or any `YYYY-MM-DD` within the month.
    pub fn parse(raw: &str) -> Option<Self> {
        let t = raw.trim();
        if let Some(date) = crate::model::parse_date(t) {
            return Some(Self::containing(date));
        }
        let (y, m) = t.split_once('-')?;
        Self::new(y.parse().ok()?, m.parse().ok()?)
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.date_of(self.days()).unwrap_or(self.first)
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year(), self.month())
    }

    pub fn date_of(&self, day: u32) -> Option<NaiveDate> {
        if day == 0 || day > self.days() {
            return None;
        }
        self.first.with_day(day)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }

    pub fn shift(&self, delta: i32) -> Self {
        let n = Months::new(delta.unsigned_abs());
        let moved = if delta >= 0 {
            self.first.checked_add_months(n)
        } else {
            self.first.checked_sub_months(n)
        };
        Self {
            first: moved.unwrap_or(self.first),
        }
    }

    /// Weekday index of the 1st, Sunday = 0.
    pub fn leading_blanks(&self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }

    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year(), self.month())
    }

    pub fn label(&self) -> String {
        self.first.format("%B %Y").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Tutor,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CalendarCell {
    Blank,
    Day(DayCell),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub day: u32,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_class: Option<&'static str>,
    pub is_today: bool,
    pub interactive: bool,
}

#[cfg(test)]
impl CalendarCell {
    pub fn as_day(&self) -> Option<&DayCell> {
        match self {
            CalendarCell::Day(d) => Some(d),
            CalendarCell::Blank => None,
        }
    }
}

pub fn render_month(
    month: MonthCursor,
    data: &AttendanceData,
    today: NaiveDate,
    viewer: Viewer,
) -> Vec<CalendarCell> {
    let blanks = month.leading_blanks();
    let mut cells: Vec<CalendarCell> = Vec::with_capacity((blanks + month.days()) as usize);
    cells.extend((0..blanks).map(|_| CalendarCell::Blank));

    for day in 1..=month.days() {
        let Some(date) = month.date_of(day) else {
            continue;
        };
        let key = format_date(date);
        let record = data.get(&key);
        cells.push(CalendarCell::Day(DayCell {
            day,
            status: record.map(|r| r.status.as_str()),
            comment: record.map(|r| r.comment.clone()),
            color_class: record.map(|r| r.status.color_class()),
            date: key,
            is_today: date == today,
            interactive: viewer == Viewer::Tutor,
        }));
    }
    cells
}
