use crate::model::{CurrentUser, Snapshot};

/// Administrator panel tabs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AdminTab {
    #[default]
    Companies,
    Students,
    Requests,
}

/// The part of the interface currently on screen, the only one redrawn on
/// refresh.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ViewPartition {
    StudentCompanies,
    AdminCompanies,
    AdminStudents,
    AdminRequests,
}

impl From<AdminTab> for ViewPartition {
    fn from(tab: AdminTab) -> Self {
        match tab {
            AdminTab::Companies => ViewPartition::AdminCompanies,
            AdminTab::Students => ViewPartition::AdminStudents,
            AdminTab::Requests => ViewPartition::AdminRequests,
        }
    }
}

pub trait View: Send {
    fn render(&mut self, partition: ViewPartition, snapshot: &Snapshot, user: &CurrentUser);
}
