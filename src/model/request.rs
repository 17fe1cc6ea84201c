use super::{CompanyId, StudentIndex};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A granted interview request. Company and student names are copied at
/// creation time and are not updated by later renames.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRequest {
    pub id: RequestId,
    pub company_id: CompanyId,
    pub company_name: String,
    pub student_index: StudentIndex,
    pub student_name: String,
    pub request_date: DateTime<Utc>,
}

impl InterviewRequest {
    pub fn is_for(&self, student: &StudentIndex, company: &CompanyId) -> bool {
        &self.student_index == student && &self.company_id == company
    }
}
