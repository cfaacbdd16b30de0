use crate::model::{AttendanceRecord, AttendanceStatus};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDraft {
    pub day: u32,
    pub status: AttendanceStatus,
    pub comment: String,
}

/// The per-day edit dialog. Only the tutor ever opens it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditModal {
    #[default]
    Closed,
    Open(EditDraft),
}

impl EditModal {
    /// Seeds the draft from the stored record, or present/empty.
    pub fn open(&mut self, day: u32, existing: Option<&AttendanceRecord>) {
        let seed = existing.cloned().unwrap_or_default();
        *self = EditModal::Open(EditDraft {
            day,
            status: seed.status,
            comment: seed.comment,
        });
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        match self {
            EditModal::Open(draft) => Some(draft),
            EditModal::Closed => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut EditDraft> {
        match self {
            EditModal::Open(draft) => Some(draft),
            EditModal::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, EditModal::Open(_))
    }

    /// Closes and hands back the (day, record) to commit.
    pub fn save(&mut self) -> Option<(u32, AttendanceRecord)> {
        match std::mem::take(self) {
            EditModal::Open(draft) => Some((
                draft.day,
                AttendanceRecord {
                    status: draft.status,
                    comment: draft.comment,
                },
            )),
            EditModal::Closed => None,
        }
    }

    pub fn cancel(&mut self) {
        *self = EditModal::Closed;
    }
}
