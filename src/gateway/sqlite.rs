use super::{Gateway, GatewayError};
use crate::model::{format_date, parse_date, AttendanceRecord, AttendanceRow, Student};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;
use uuid::Uuid;

/// Local relational store enforcing the hosted schema's constraints.
pub struct SqliteGateway {
    conn: Connection,
}

impl SqliteGateway {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_name ON students(name)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL CHECK(status IN ('present', 'absent', 'holiday', 'extra')),
            comment TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id) ON DELETE CASCADE,
            UNIQUE(student_id, date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_student_date ON attendance(student_id, date)",
        [],
    )?;
    Ok(())
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl Gateway for SqliteGateway {
    fn select_students(&self) -> Result<Vec<Student>, GatewayError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, created_at FROM students ORDER BY name ASC, created_at ASC",
        )?;
        let students = stmt
            .query_map([], |r| {
                Ok(Student {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    created_at: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    fn insert_student(&self, name: &str) -> Result<Student, GatewayError> {
        let student = Student {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: now_rfc3339(),
        };
        self.conn.execute(
            "INSERT INTO students(id, name, created_at) VALUES(?, ?, ?)",
            (&student.id, &student.name, &student.created_at),
        )?;
        Ok(student)
    }

    fn delete_student(&self, student_id: &str) -> Result<(), GatewayError> {
        self.conn
            .execute("DELETE FROM students WHERE id = ?", [student_id])?;
        Ok(())
    }

    fn select_attendance(
        &self,
        student_id: &str,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<AttendanceRow>, GatewayError> {
        let mut stmt = self.conn.prepare(
            "SELECT student_id, date, status, comment
             FROM attendance
             WHERE student_id = ? AND date >= ? AND date <= ?
             ORDER BY date",
        )?;
        let raw = stmt
            .query_map((student_id, format_date(first), format_date(last)), |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(student_id, date, status, comment)| {
                let date = parse_date(&date).ok_or_else(|| GatewayError::InvalidRow {
                    table: "attendance",
                    message: format!("bad date {date}"),
                })?;
                let status = status.parse().map_err(|e| GatewayError::InvalidRow {
                    table: "attendance",
                    message: format!("{e}"),
                })?;
                Ok(AttendanceRow {
                    student_id,
                    date,
                    record: AttendanceRecord {
                        status,
                        comment: comment.unwrap_or_default(),
                    },
                })
            })
            .collect()
    }

    fn upsert_attendance(
        &self,
        student_id: &str,
        date: NaiveDate,
        record: &AttendanceRecord,
    ) -> Result<(), GatewayError> {
        self.conn.execute(
            "INSERT INTO attendance(id, student_id, date, status, comment, created_at)
             VALUES(?, ?, ?, ?, ?, ?)
             ON CONFLICT(student_id, date) DO UPDATE SET
               status = excluded.status,
               comment = excluded.comment",
            (
                Uuid::new_v4().to_string(),
                student_id,
                format_date(date),
                record.status.as_str(),
                &record.comment,
                now_rfc3339(),
            ),
        )?;
        Ok(())
    }
}
