use crate::calendar::Viewer;
use crate::config::TutorSecretConfig;
use crate::model::Student;
use serde::Serialize;
use sha2::{Digest, Sha256};

pub trait CredentialVerifier {
    fn verify(&self, code: &str) -> bool;
}

/// The configured tutor secret. With nothing configured every code is rejected.
pub struct TutorSecret {
    expected: Option<TutorSecretConfig>,
}

impl TutorSecret {
    pub fn new(expected: Option<TutorSecretConfig>) -> Self {
        Self { expected }
    }

    pub fn is_configured(&self) -> bool {
        self.expected.is_some()
    }
}

fn sha256_hex(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

impl CredentialVerifier for TutorSecret {
    fn verify(&self, code: &str) -> bool {
        match &self.expected {
            Some(TutorSecretConfig::Plain(secret)) => code == secret,
            Some(TutorSecretConfig::Sha256Hex(digest)) => sha256_hex(code) == *digest,
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum Identity {
    Tutor,
    #[serde(rename = "parent")]
    Student {
        #[serde(rename = "studentId")]
        id: String,
        name: String,
    },
}

impl Identity {
    pub fn viewer(&self) -> Viewer {
        match self {
            Identity::Tutor => Viewer::Tutor,
            Identity::Student { .. } => Viewer::Parent,
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Identity::Tutor => "tutor",
            Identity::Student { .. } => "parent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("Invalid tutor code")]
    InvalidCode,
    #[error("Please select a student")]
    NoStudentSelected,
    #[error("Unknown student")]
    UnknownStudent,
}

/// Who is logged in for the lifetime of the process. Nothing is persisted.
pub struct Session {
    verifier: Box<dyn CredentialVerifier>,
    identity: Option<Identity>,
}

impl Session {
    pub fn new(verifier: Box<dyn CredentialVerifier>) -> Self {
        Self {
            verifier,
            identity: None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_tutor(&self) -> bool {
        matches!(self.identity, Some(Identity::Tutor))
    }

    /// Any earlier identity is dropped first, so a failed attempt leaves
    /// nobody logged in.
    pub fn login_tutor(&mut self, code: &str) -> Result<&Identity, LoginError> {
        self.logout();
        if !self.verifier.verify(code) {
            tracing::info!("tutor login rejected");
            return Err(LoginError::InvalidCode);
        }
        tracing::info!("tutor logged in");
        Ok(self.identity.insert(Identity::Tutor))
    }

    /// `selection` must resolve to a student in the already-fetched roster.
    pub fn login_parent(
        &mut self,
        selection: Option<&str>,
        roster: &[Student],
    ) -> Result<&Identity, LoginError> {
        self.logout();
        let Some(student_id) = selection.filter(|s| !s.is_empty()) else {
            return Err(LoginError::NoStudentSelected);
        };
        let Some(student) = roster.iter().find(|s| s.id == student_id) else {
            tracing::info!(student_id, "parent login for unknown student");
            return Err(LoginError::UnknownStudent);
        };
        tracing::info!(student_id, "parent logged in");
        Ok(self.identity.insert(Identity::Student {
            id: student.id.clone(),
            name: student.name.clone(),
        }))
    }

    pub fn logout(&mut self) {
        if self.identity.take().is_some() {
            tracing::info!("logged out");
        }
    }
}
