use super::{Student, StudentIndex};
use serde::{Deserialize, Serialize};

pub const ADMIN_DISPLAY_NAME: &str = "Administrator";

/// The identity logged in within one session.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredUser", into = "StoredUser")]
pub enum CurrentUser {
    Admin {
        name: String,
    },
    Student {
        index: StudentIndex,
        name: String,
        remaining_requests: u32,
    },
}

impl CurrentUser {
    pub fn admin() -> Self {
        Self::Admin {
            name: ADMIN_DISPLAY_NAME.to_owned(),
        }
    }

    pub fn for_student(student: &Student) -> Self {
        Self::Student {
            index: student.index.clone(),
            name: student.name.clone(),
            remaining_requests: student.remaining_requests,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Admin { name } | Self::Student { name, .. } => name,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. })
    }

    pub fn student_index(&self) -> Option<&StudentIndex> {
        match self {
            Self::Admin { .. } => None,
            Self::Student { index, .. } => Some(index),
        }
    }

    pub fn remaining_requests(&self) -> Option<u32> {
        match self {
            Self::Admin { .. } => None,
            Self::Student {
                remaining_requests, ..
            } => Some(*remaining_requests),
        }
    }
}

// Flat stored form: `{name, isAdmin}` for the administrator,
// `{index, name, isAdmin, remainingRequests}` for students.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<StudentIndex>,
    name: String,
    is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remaining_requests: Option<u32>,
}

impl TryFrom<StoredUser> for CurrentUser {
    type Error = String;

    fn try_from(stored: StoredUser) -> Result<Self, Self::Error> {
        if stored.is_admin {
            return Ok(Self::Admin { name: stored.name });
        }
        let index = stored
            .index
            .ok_or_else(|| "student record without index".to_owned())?;
        Ok(Self::Student {
            index,
            name: stored.name,
            remaining_requests: stored.remaining_requests.unwrap_or(0),
        })
    }
}

impl From<CurrentUser> for StoredUser {
    fn from(user: CurrentUser) -> Self {
        match user {
            CurrentUser::Admin { name } => Self {
                index: None,
                name,
                is_admin: true,
                remaining_requests: None,
            },
            CurrentUser::Student {
                index,
                name,
                remaining_requests,
            } => Self {
                index: Some(index),
                name,
                is_admin: false,
                remaining_requests: Some(remaining_requests),
            },
        }
    }
}
