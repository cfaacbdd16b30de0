use crate::calendar::{AttendanceData, MonthCursor};
use crate::gateway::{GatewayError, SharedGateway};
use crate::model::{format_date, AttendanceRecord, AttendanceRow};

/// Identifies one outstanding attendance fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub student_id: String,
    pub month: MonthCursor,
}

/// Per-student, per-month attendance cache.
///
/// The mapping only ever holds dates inside `month` for `student_id`;
/// changing either throws it away and refetches.
pub struct AttendanceViewModel {
    gateway: SharedGateway,
    student_id: Option<String>,
    month: MonthCursor,
    data: AttendanceData,
    loading: bool,
    generation: u64,
}

impl AttendanceViewModel {
    pub fn new(gateway: SharedGateway, month: MonthCursor) -> Self {
        Self {
            gateway,
            student_id: None,
            month,
            data: AttendanceData::new(),
            loading: false,
            generation: 0,
        }
    }

    pub fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }

    pub fn month(&self) -> MonthCursor {
        self.month
    }

    pub fn data(&self) -> &AttendanceData {
        &self.data
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn record_for_day(&self, day: u32) -> Option<&AttendanceRecord> {
        let date = self.month.date_of(day)?;
        self.data.get(&format_date(date))
    }

    pub fn select_student(&mut self, student_id: Option<String>) {
        self.student_id = student_id;
        self.refresh();
    }

    pub fn set_month(&mut self, month: MonthCursor) {
        self.month = month;
        self.refresh();
    }

    pub fn navigate(&mut self, delta: i32) {
        self.set_month(self.month.shift(delta));
    }

    pub fn refresh(&mut self) {
        if let Some(ticket) = self.begin_fetch() {
            let result = self.gateway.select_attendance(
                &ticket.student_id,
                ticket.month.first_day(),
                ticket.month.last_day(),
            );
            self.complete_fetch(ticket, result);
        }
    }

    /// Starts a fetch for the current selection, superseding any earlier one.
    /// With no student selected the mapping is cleared and no fetch starts.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        self.generation += 1;
        self.data.clear();
        let Some(student_id) = self.student_id.clone() else {
            self.loading = false;
            return None;
        };
        self.loading = true;
        tracing::debug!(
            student_id = %student_id,
            month = %self.month.key(),
            generation = self.generation,
            "fetching attendance"
        );
        Some(FetchTicket {
            generation: self.generation,
            student_id,
            month: self.month,
        })
    }

    /// Applies a fetch result unless a newer fetch has started since.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<AttendanceRow>, GatewayError>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                generation = ticket.generation,
                current = self.generation,
                "discarding stale attendance fetch"
            );
            return false;
        }
        self.loading = false;
        let rows = match result {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(
                    student_id = %ticket.student_id,
                    month = %ticket.month.key(),
                    error = %e,
                    "failed to fetch attendance"
                );
                return true;
            }
        };
        self.data = rows
            .into_iter()
            .filter(|row| row.student_id == ticket.student_id && ticket.month.contains(row.date))
            .map(|row| (format_date(row.date), row.record))
            .collect();
        true
    }

    /// Upserts one day of the current month and merges it locally on success.
    /// Failures are logged and leave the mapping untouched.
    pub fn commit_edit(&mut self, day: u32, record: AttendanceRecord) {
        let Some(student_id) = self.student_id.clone() else {
            tracing::warn!(day, "attendance edit without a selected student");
            return;
        };
        let Some(date) = self.month.date_of(day) else {
            tracing::warn!(day, month = %self.month.key(), "attendance edit outside month");
            return;
        };
        match self.gateway.upsert_attendance(&student_id, date, &record) {
            Ok(()) => {
                tracing::info!(
                    student_id = %student_id,
                    date = %date,
                    status = %record.status,
                    "attendance saved"
                );
                self.data.insert(format_date(date), record);
            }
            Err(e) => {
                tracing::error!(
                    student_id = %student_id,
                    date = %date,
                    error = %e,
                    "failed to save attendance"
                );
            }
        }
    }

    /// Drops the selection if it points at `student_id`.
    pub fn forget_student(&mut self, student_id: &str) {
        if self.student_id.as_deref() == Some(student_id) {
            self.select_student(None);
        }
    }
}
