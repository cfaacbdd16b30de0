mod rest;
mod sqlite;

pub use rest::RestGateway;
pub use sqlite::SqliteGateway;

use crate::config::GatewayConfig;
use crate::model::{AttendanceRecord, AttendanceRow, Student};
use anyhow::Context;
use chrono::NaiveDate;
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed {table} row: {message}")]
    InvalidRow { table: &'static str, message: String },

    #[error("unsupported gateway url: {0}")]
    UnsupportedUrl(String),
}

/// Table-level CRUD against the hosted `students` / `attendance` schema.
///
/// Deleting a student cascades to its attendance rows on the store side.
pub trait Gateway {
    /// All students ordered by name ascending.
    fn select_students(&self) -> Result<Vec<Student>, GatewayError>;

    /// Inserts a student with only a name; the store assigns id and timestamp.
    fn insert_student(&self, name: &str) -> Result<Student, GatewayError>;

    fn delete_student(&self, student_id: &str) -> Result<(), GatewayError>;

    /// Rows for one student whose date lies in `[first, last]`.
    fn select_attendance(
        &self,
        student_id: &str,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<AttendanceRow>, GatewayError>;

    /// Create-or-replace keyed by (student_id, date).
    fn upsert_attendance(
        &self,
        student_id: &str,
        date: NaiveDate,
        record: &AttendanceRecord,
    ) -> Result<(), GatewayError>;
}

pub type SharedGateway = Rc<dyn Gateway>;

/// Opens the gateway named by the configured endpoint URL.
pub fn open_gateway(cfg: &GatewayConfig) -> anyhow::Result<SharedGateway> {
    let url = cfg.url.trim();
    if let Some(rest) = url.strip_prefix("sqlite:") {
        let gw = if rest == ":memory:" {
            SqliteGateway::open_in_memory()
        } else {
            SqliteGateway::open(rest.trim_start_matches("//"))
        }
        .with_context(|| format!("failed to open sqlite gateway at {url}"))?;
        return Ok(Rc::new(gw));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        let gw = RestGateway::new(url, &cfg.api_key)
            .with_context(|| format!("failed to build rest gateway for {url}"))?;
        return Ok(Rc::new(gw));
    }
    Err(GatewayError::UnsupportedUrl(url.to_string()).into())
}
