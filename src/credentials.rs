use crate::config::AdminAccount;
use crate::model::Student;

/// Decides whether presented credentials match. Passwords are currently kept
/// and compared in clear text; a hashing implementation can replace
/// [`PlaintextCredentials`] without touching the booking rules.
pub trait CredentialCheck: Send + Sync {
    fn student_matches(&self, student: &Student, password: &str) -> bool;
    fn admin_matches(&self, username: &str, password: &str) -> bool;
}

#[derive(Clone, Debug)]
pub struct PlaintextCredentials {
    admin: AdminAccount,
}

impl PlaintextCredentials {
    pub fn new(admin: AdminAccount) -> Self {
        Self { admin }
    }
}

impl Default for PlaintextCredentials {
    fn default() -> Self {
        Self::new(AdminAccount::default())
    }
}

impl CredentialCheck for PlaintextCredentials {
    fn student_matches(&self, student: &Student, password: &str) -> bool {
        student.password == password
    }

    fn admin_matches(&self, username: &str, password: &str) -> bool {
        self.admin.username == username && self.admin.password == password
    }
}
