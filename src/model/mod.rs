pub use self::company::{Company, CompanyId};
pub use self::request::{InterviewRequest, RequestId};
pub use self::snapshot::{RequestGroup, Snapshot};
pub use self::student::{INITIAL_REQUESTS, Student, StudentIndex};
pub use self::user::{ADMIN_DISPLAY_NAME, CurrentUser};

mod company;
mod request;
mod snapshot;
mod student;
mod user;
