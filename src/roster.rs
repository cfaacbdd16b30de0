use crate::gateway::SharedGateway;
use crate::model::Student;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("Please enter a student name")]
    BlankName,
    #[error("Unknown student")]
    UnknownStudent,
    #[error("No delete is awaiting confirmation")]
    NothingToConfirm,
}

/// Cached, name-ordered student list plus add/delete.
///
/// Read failures leave an empty (or the previous) list in place, write
/// failures are logged and skip the refetch. Callers never see gateway
/// errors from here.
pub struct Roster {
    gateway: SharedGateway,
    students: Vec<Student>,
    loaded: bool,
    pending_delete: Option<Student>,
}

impl Roster {
    /// Performs the initial fetch; `loaded` is set whatever the outcome.
    pub fn load(gateway: SharedGateway) -> Self {
        let mut roster = Self {
            gateway,
            students: Vec::new(),
            loaded: false,
            pending_delete: None,
        };
        roster.refetch();
        roster
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn find(&self, student_id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == student_id)
    }

    pub fn pending_delete(&self) -> Option<&Student> {
        self.pending_delete.as_ref()
    }

    pub fn refetch(&mut self) {
        match self.gateway.select_students() {
            Ok(students) => {
                tracing::debug!(count = students.len(), "roster fetched");
                self.students = students;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch students");
            }
        }
        self.loaded = true;
    }

    pub fn add(&mut self, name: &str) -> Result<(), RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::BlankName);
        }
        match self.gateway.insert_student(name) {
            Ok(student) => {
                tracing::info!(student_id = %student.id, "student added");
                self.refetch();
            }
            Err(e) => tracing::error!(error = %e, "failed to add student"),
        }
        Ok(())
    }

    /// First step of delete: remembers the target until confirmed or cancelled.
    pub fn request_delete(&mut self, student_id: &str) -> Result<&Student, RosterError> {
        let student = self
            .find(student_id)
            .cloned()
            .ok_or(RosterError::UnknownStudent)?;
        Ok(self.pending_delete.insert(student))
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Returns the id that was targeted.
    pub fn confirm_delete(&mut self) -> Result<String, RosterError> {
        let student = self
            .pending_delete
            .take()
            .ok_or(RosterError::NothingToConfirm)?;
        match self.gateway.delete_student(&student.id) {
            Ok(()) => {
                tracing::info!(student_id = %student.id, "student deleted");
                self.refetch();
            }
            Err(e) => {
                tracing::error!(student_id = %student.id, error = %e, "failed to delete student")
            }
        }
        Ok(student.id)
    }
}
