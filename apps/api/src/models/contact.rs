use serde::{Deserialize, Serialize};

/// Addresses are only accepted when they contain an `@`.
pub fn is_valid_address(address: &str) -> bool {
    address.contains('@')
}

/// Editing state of a row as seen by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowState {
    Clean,
    Dirty,
    Saved,
    Regenerating,
}

/// One recruiter contact with its job description and email draft.
///
/// Identity is `address`. `original_content` is the baseline draft and never
/// changes; `draft_content` follows edits and regenerations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub address: String,
    pub job_description: String,
    pub draft_content: String,
    pub original_content: String,
    pub saved: bool,
    pub dirty: bool,
    pub regenerating: bool,
}

impl ContactRecord {
    pub fn new(
        address: String,
        job_description: String,
        draft_content: String,
        original_content: String,
    ) -> Self {
        Self {
            address,
            job_description,
            draft_content,
            original_content,
            saved: false,
            dirty: false,
            regenerating: false,
        }
    }

    pub fn state(&self) -> RowState {
        if self.regenerating {
            RowState::Regenerating
        } else if self.dirty {
            RowState::Dirty
        } else if self.saved {
            RowState::Saved
        } else {
            RowState::Clean
        }
    }
}
