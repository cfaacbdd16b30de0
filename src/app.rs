use crate::attendance::AttendanceViewModel;
use crate::calendar::{render_month, CalendarCell, MonthCursor, Viewer};
use crate::gateway::SharedGateway;
use crate::modal::EditModal;
use crate::roster::{Roster, RosterError};
use crate::session::{CredentialVerifier, Identity, LoginError, Session};
use chrono::NaiveDate;

/// Everything that exists once the gateway is configured. Each component
/// gets the same gateway handle at construction.
pub struct App {
    pub roster: Roster,
    pub session: Session,
    pub calendar: AttendanceViewModel,
    pub modal: EditModal,
}

impl App {
    pub fn new(
        gateway: SharedGateway,
        verifier: Box<dyn CredentialVerifier>,
        month: MonthCursor,
    ) -> Self {
        Self {
            roster: Roster::load(gateway.clone()),
            session: Session::new(verifier),
            calendar: AttendanceViewModel::new(gateway, month),
            modal: EditModal::Closed,
        }
    }

    /// Logging in over an active session ends it first, whatever the outcome.
    pub fn login_tutor(&mut self, code: &str) -> Result<Identity, LoginError> {
        self.logout();
        let identity = self.session.login_tutor(code)?.clone();
        Ok(identity)
    }

    pub fn login_parent(&mut self, selection: Option<&str>) -> Result<Identity, LoginError> {
        self.logout();
        let identity = self
            .session
            .login_parent(selection, self.roster.students())?
            .clone();
        if let Identity::Student { id, .. } = &identity {
            self.calendar.select_student(Some(id.clone()));
        }
        Ok(identity)
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.modal.cancel();
        self.roster.cancel_delete();
        self.calendar.select_student(None);
    }

    pub fn confirm_delete(&mut self) -> Result<(), RosterError> {
        let student_id = self.roster.confirm_delete()?;
        if self.roster.find(&student_id).is_none() {
            self.calendar.forget_student(&student_id);
        }
        Ok(())
    }

    /// Closes the modal and writes its draft through the view-model.
    pub fn save_modal(&mut self) -> bool {
        let Some((day, record)) = self.modal.save() else {
            return false;
        };
        self.calendar.commit_edit(day, record);
        true
    }

    pub fn viewer(&self) -> Option<Viewer> {
        self.session.identity().map(Identity::viewer)
    }

    pub fn render(&self, today: NaiveDate) -> Vec<CalendarCell> {
        render_month(
            self.calendar.month(),
            self.calendar.data(),
            today,
            self.viewer().unwrap_or(Viewer::Parent),
        )
    }
}
