use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub String);

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompanyId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub total_slots: u32,
    pub available_slots: u32,
}

impl Company {
    /// Slots already consumed by granted requests.
    pub fn used_slots(&self) -> u32 {
        self.total_slots.saturating_sub(self.available_slots)
    }

    pub fn has_free_slot(&self) -> bool {
        self.available_slots > 0
    }

    pub fn slots_text(&self) -> String {
        format!(
            "{} of {} slots available",
            self.available_slots, self.total_slots
        )
    }

    pub fn description_or_default(&self) -> &str {
        if self.description.is_empty() {
            "No description available."
        } else {
            &self.description
        }
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}
