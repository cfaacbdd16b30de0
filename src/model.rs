use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Holiday,
    Extra,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Holiday,
        AttendanceStatus::Extra,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Holiday => "holiday",
            AttendanceStatus::Extra => "extra",
        }
    }

    /// CSS class the calendar uses to color a day cell.
    pub fn color_class(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "status-present",
            AttendanceStatus::Absent => "status-absent",
            AttendanceStatus::Holiday => "status-holiday",
            AttendanceStatus::Extra => "status-extra",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown attendance status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for AttendanceStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttendanceStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AttendanceRecord {
    pub status: AttendanceStatus,
    pub comment: String,
}

/// One `attendance` row as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRow {
    pub student_id: String,
    pub date: NaiveDate,
    pub record: AttendanceRecord,
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `YYYY-MM-DD`, or a timestamp whose date part is followed by `T` or a space.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Hosted services may hand back timestamps for date columns.
    let t = raw.trim();
    let date_part = match t.as_bytes().get(10) {
        None => t,
        Some(b'T' | b' ') => t.get(..10)?,
        Some(_) => return None,
    };
    if date_part.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_only_the_four_values() {
        for st in AttendanceStatus::ALL {
            assert_eq!(st.as_str().parse::<AttendanceStatus>(), Ok(st));
        }
        assert!("late".parse::<AttendanceStatus>().is_err());
        assert!("Present".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn parse_date_accepts_timestamp_suffix() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_date("2024-03-05"), Some(d));
        assert_eq!(parse_date("2024-03-05T00:00:00+00:00"), Some(d));
        assert_eq!(parse_date("2024-03-05 00:00:00"), Some(d));
        assert_eq!(parse_date("05/03/2024"), None);
    }

    #[test]
    fn parse_date_rejects_trailing_garbage() {
        assert_eq!(parse_date("2024-03-05junk"), None);
        assert_eq!(parse_date("2024-03-05xyz"), None);
        assert_eq!(parse_date("2024-03-051"), None);
        assert_eq!(parse_date("2024-3-5"), None);
    }
}
