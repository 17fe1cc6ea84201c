use crate::model::*;
use crate::stats;
use crate::view::{View, ViewPartition};
use chrono::Local;
use serde::Serialize;
use std::io::{self, Write};
use tracing::warn;

pub fn display_header(out: &mut impl Write, user: &CurrentUser) -> io::Result<()> {
    match user {
        CurrentUser::Admin { name } => writeln!(out, "{name} (Admin)"),
        CurrentUser::Student {
            index,
            name,
            remaining_requests,
        } => writeln!(
            out,
            "{name} ({index}) - remaining requests: {remaining_requests}"
        ),
    }
}

/// Companies as seen by a student, with the reason a company cannot be
/// requested when there is one.
pub fn display_student_companies(
    out: &mut impl Write,
    snapshot: &Snapshot,
    user: &CurrentUser,
) -> io::Result<()> {
    let Some(index) = user.student_index() else {
        return Ok(());
    };
    if snapshot.companies.is_empty() {
        return writeln!(out, "No companies available yet.");
    }
    let no_requests_left = user.remaining_requests() == Some(0);
    for company in &snapshot.companies {
        let already_requested = snapshot.has_requested(index, &company.id);
        writeln!(out, "{}  [{}]", company.name, company.id)?;
        writeln!(out, "  {}", company.description_or_default())?;
        writeln!(out, "  Available slots: {}", company.slots_text())?;
        if already_requested {
            writeln!(out, "  Already Requested")?;
        } else if !company.has_free_slot() {
            writeln!(out, "  No Slots Available")?;
        } else if no_requests_left {
            writeln!(out, "  No requests left")?;
        }
    }
    Ok(())
}

pub fn display_admin_companies(out: &mut impl Write, snapshot: &Snapshot) -> io::Result<()> {
    if snapshot.companies.is_empty() {
        return writeln!(out, "No companies added yet.");
    }
    for company in &snapshot.companies {
        writeln!(out, "{}  [{}]", company.name, company.id)?;
        writeln!(out, "  {}", company.description_or_default())?;
        writeln!(out, "  Available slots: {}", company.slots_text())?;
    }
    let summary = stats::summary(snapshot);
    writeln!(
        out,
        "Slots used/total: {}/{} - full companies: {}/{} - students out of requests: {}/{}",
        summary.used_slots,
        summary.total_slots,
        summary.full_companies,
        summary.companies,
        summary.exhausted_students,
        summary.students
    )
}

pub fn display_students(out: &mut impl Write, snapshot: &Snapshot) -> io::Result<()> {
    if snapshot.students.is_empty() {
        return writeln!(out, "No students registered yet.");
    }
    writeln!(
        out,
        "{:<8} {:<24} {:<32} {:>9}  Registration date",
        "Index", "Name", "Email", "Remaining"
    )?;
    for student in snapshot.students_by_registration() {
        writeln!(
            out,
            "{:<8} {:<24} {:<32} {:>9}  {}",
            student.index,
            student.name,
            student.email,
            student.remaining_requests,
            student
                .registration_date
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
        )?;
    }
    Ok(())
}

pub fn display_requests(out: &mut impl Write, snapshot: &Snapshot) -> io::Result<()> {
    let groups = snapshot.requests_by_company();
    if groups.is_empty() {
        return writeln!(out, "No interview requests yet.");
    }
    for group in groups {
        writeln!(out, "{} ({} requests):", group.company_name, group.requests.len())?;
        for request in group.requests {
            writeln!(
                out,
                "  - {} ({}) on {}",
                request.student_name,
                request.student_index,
                request
                    .request_date
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
            )?;
        }
    }
    Ok(())
}

pub fn display_partition(
    out: &mut impl Write,
    partition: ViewPartition,
    snapshot: &Snapshot,
    user: &CurrentUser,
) -> io::Result<()> {
    match partition {
        ViewPartition::StudentCompanies => display_student_companies(out, snapshot, user),
        ViewPartition::AdminCompanies => display_admin_companies(out, snapshot),
        ViewPartition::AdminStudents => display_students(out, snapshot),
        ViewPartition::AdminRequests => display_requests(out, snapshot),
    }
}

/// Draws refreshed partitions on a terminal or any other writer.
pub struct ConsoleView<W> {
    out: W,
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> View for ConsoleView<W> {
    fn render(&mut self, partition: ViewPartition, snapshot: &Snapshot, user: &CurrentUser) {
        let result = display_header(&mut self.out, user)
            .and_then(|()| display_partition(&mut self.out, partition, snapshot, user))
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            warn!(error = %e, "cannot draw view");
        }
    }
}

#[derive(Serialize)]
struct StudentRow<'a> {
    index: &'a StudentIndex,
    name: &'a str,
    email: &'a str,
    remaining_requests: u32,
    registration_date: String,
}

pub fn export_students(out: impl Write, snapshot: &Snapshot) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for student in snapshot.students_by_registration() {
        writer.serialize(StudentRow {
            index: &student.index,
            name: &student.name,
            email: &student.email,
            remaining_requests: student.remaining_requests,
            registration_date: student.registration_date.to_rfc3339(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct RequestRow<'a> {
    company_id: &'a CompanyId,
    company_name: &'a str,
    student_index: &'a StudentIndex,
    student_name: &'a str,
    request_date: String,
}

pub fn export_requests(out: impl Write, snapshot: &Snapshot) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for group in snapshot.requests_by_company() {
        for request in group.requests {
            writer.serialize(RequestRow {
                company_id: &request.company_id,
                company_name: &request.company_name,
                student_index: &request.student_index,
                student_name: &request.student_name,
                request_date: request.request_date.to_rfc3339(),
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snapshot() -> Snapshot {
        let company = |id: &str, name: &str, total_slots, available_slots| Company {
            id: CompanyId::from(id),
            name: name.into(),
            description: String::new(),
            total_slots,
            available_slots,
        };
        Snapshot::new(
            vec![
                company("1", "Acme", 2, 1),
                company("2", "Globex", 1, 0),
                company("3", "Initech", 3, 3),
            ],
            vec![Student {
                index: StudentIndex::from("202601A"),
                name: "Ada".into(),
                email: "ada@example.org".into(),
                password: "x".into(),
                remaining_requests: 4,
                registration_date: Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap(),
            }],
            vec![InterviewRequest {
                id: RequestId("10".into()),
                company_id: CompanyId::from("1"),
                company_name: "Acme".into(),
                student_index: StudentIndex::from("202601A"),
                student_name: "Ada".into(),
                request_date: Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap(),
            }],
        )
    }

    fn render(partition: ViewPartition, user: &CurrentUser) -> String {
        let mut view = ConsoleView::new(Vec::new());
        view.render(partition, &snapshot(), user);
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn test_student_view_labels() {
        let user = CurrentUser::Student {
            index: StudentIndex::from("202601A"),
            name: "Ada".into(),
            remaining_requests: 4,
        };
        let text = render(ViewPartition::StudentCompanies, &user);
        assert!(text.starts_with("Ada (202601A) - remaining requests: 4\n"));
        assert!(text.contains("Available slots: 1 of 2 slots available\n  Already Requested"));
        assert!(text.contains("Available slots: 0 of 1 slots available\n  No Slots Available"));
        assert!(!text.contains("No requests left"));
    }

    #[test]
    fn test_student_without_requests_left() {
        let user = CurrentUser::Student {
            index: StudentIndex::from("202602B"),
            name: "Bob".into(),
            remaining_requests: 0,
        };
        let text = render(ViewPartition::StudentCompanies, &user);
        assert!(text.contains("3 of 3 slots available\n  No requests left"));
        assert!(!text.contains("Already Requested"));
    }

    #[test]
    fn test_admin_partitions() {
        let admin = CurrentUser::admin();
        let companies = render(ViewPartition::AdminCompanies, &admin);
        assert!(companies.starts_with("Administrator (Admin)\n"));
        assert!(companies.contains("Slots used/total: 2/6"));
        let requests = render(ViewPartition::AdminRequests, &admin);
        assert!(requests.contains("Acme (1 requests):\n  - Ada (202601A) on "));
        let students = render(ViewPartition::AdminStudents, &admin);
        assert!(students.contains("ada@example.org"));
        assert!(!students.contains("Acme"));
    }

    #[test]
    fn test_csv_exports() {
        let mut out = Vec::new();
        export_requests(&mut out, &snapshot()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("company_id,company_name,student_index,student_name,request_date")
        );
        assert_eq!(
            lines.next(),
            Some("1,Acme,202601A,Ada,2026-10-01T09:00:00+00:00")
        );

        let mut out = Vec::new();
        export_students(&mut out, &snapshot()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("index,name,email,remaining_requests,registration_date\n"));
        assert!(!text.contains(",x,"));
    }
}
