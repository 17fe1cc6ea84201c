use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Number of interview requests every student starts with.
pub const INITIAL_REQUESTS: u32 = 5;

// Academic year (2026 or 2027), two-digit sequence, check letter.
static INDEX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^202[6-7][0-9]{2}[A-Z]$").expect("index pattern is valid"));

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentIndex(pub String);

impl StudentIndex {
    pub fn is_well_formed(&self) -> bool {
        INDEX_PATTERN.is_match(&self.0)
    }
}

impl fmt::Display for StudentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentIndex {
    fn from(index: &str) -> Self {
        Self(index.to_owned())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub index: StudentIndex,
    pub name: String,
    pub email: String,
    pub password: String,
    pub remaining_requests: u32,
    pub registration_date: DateTime<Utc>,
}

impl Student {
    pub fn used_requests(&self) -> u32 {
        INITIAL_REQUESTS.saturating_sub(self.remaining_requests)
    }

    pub fn has_requests_left(&self) -> bool {
        self.remaining_requests > 0
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_pattern() {
        for good in ["202601A", "202742U", "202699Z"] {
            assert!(StudentIndex::from(good).is_well_formed(), "{good}");
        }
        for bad in ["202501A", "202801A", "20260A", "202601a", "202601AB", " 202601A", ""] {
            assert!(!StudentIndex::from(bad).is_well_formed(), "{bad}");
        }
    }
}
