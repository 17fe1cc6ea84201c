//! Booking rules. Every operation validates first and only then mutates the
//! snapshot, so a failed call leaves it untouched.

use crate::credentials::CredentialCheck;
use crate::errors::{BookingError, BookingResult};
use crate::model::*;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Time-derived identifier, bumped past any identifier already in use.
fn fresh_id<F>(now: DateTime<Utc>, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut millis = now.timestamp_millis();
    loop {
        let id = millis.to_string();
        if !taken(&id) {
            return id;
        }
        millis += 1;
    }
}

fn required(value: &str, what: &str) -> BookingResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BookingError::Validation(format!("{what} is required")));
    }
    Ok(value.to_owned())
}

fn check_slots(total_slots: u32) -> BookingResult<()> {
    if total_slots < 1 {
        return Err(BookingError::Validation(
            "a company must offer at least one slot".to_owned(),
        ));
    }
    Ok(())
}

pub fn create_company(
    snapshot: &mut Snapshot,
    name: &str,
    description: &str,
    total_slots: u32,
    now: DateTime<Utc>,
) -> BookingResult<Company> {
    let name = required(name, "company name")?;
    check_slots(total_slots)?;
    let id = fresh_id(now, |id| snapshot.companies.iter().any(|c| c.id.0 == id));
    let company = Company {
        id: CompanyId(id),
        name,
        description: description.trim().to_owned(),
        total_slots,
        available_slots: total_slots,
    };
    info!(company = %company, total_slots, "company created");
    snapshot.companies.push(company.clone());
    Ok(company)
}

/// Rename a company and resize its capacity. Capacity cannot shrink below
/// the slots already taken by granted requests.
pub fn update_company(
    snapshot: &mut Snapshot,
    id: &CompanyId,
    name: &str,
    description: &str,
    new_total_slots: u32,
) -> BookingResult<Company> {
    let name = required(name, "company name")?;
    check_slots(new_total_slots)?;
    let company = snapshot
        .company_mut(id)
        .ok_or_else(|| BookingError::NotFound(format!("company {id}")))?;
    let used_slots = company.used_slots();
    if new_total_slots < used_slots {
        return Err(BookingError::Capacity(format!(
            "cannot reduce slots below {used_slots} (slots already used)"
        )));
    }
    company.name = name;
    company.description = description.trim().to_owned();
    company.total_slots = new_total_slots;
    company.available_slots = new_total_slots - used_slots;
    info!(
        company = %company,
        total_slots = company.total_slots,
        available_slots = company.available_slots,
        "company updated"
    );
    Ok(company.clone())
}

/// Remove a company that nobody has requested yet.
pub fn delete_company(snapshot: &mut Snapshot, id: &CompanyId) -> BookingResult<Company> {
    if snapshot.is_requested(id) {
        return Err(BookingError::Conflict(
            "cannot delete company with interview requests".to_owned(),
        ));
    }
    let position = snapshot
        .companies
        .iter()
        .position(|c| &c.id == id)
        .ok_or_else(|| BookingError::NotFound(format!("company {id}")))?;
    let company = snapshot.companies.remove(position);
    info!(company = %company, "company deleted");
    Ok(company)
}

/// Grant `actor` an interview with a company. The checks run in a fixed
/// order and the first failing one is reported. On success the request is
/// recorded, one slot and one quota unit are consumed, and the cached quota
/// of `actor` is refreshed.
pub fn request_interview(
    snapshot: &mut Snapshot,
    actor: &mut CurrentUser,
    company_id: &CompanyId,
    now: DateTime<Utc>,
) -> BookingResult<InterviewRequest> {
    let CurrentUser::Student {
        index,
        remaining_requests: cached_remaining,
        ..
    } = actor
    else {
        return Err(BookingError::Forbidden(
            "administrators cannot make interview requests".to_owned(),
        ));
    };
    let company = snapshot
        .company(company_id)
        .ok_or_else(|| BookingError::NotFound(format!("company {company_id}")))?;
    if !company.has_free_slot() {
        return Err(BookingError::Capacity(format!(
            "no interview slots available for {}",
            company.name
        )));
    }
    let student = snapshot
        .student(index)
        .ok_or_else(|| BookingError::NotFound(format!("student {index}")))?;
    if !student.has_requests_left() {
        return Err(BookingError::Quota);
    }
    if snapshot.has_requested(index, company_id) {
        return Err(BookingError::Duplicate(format!(
            "you have already requested an interview with {}",
            company.name
        )));
    }

    let request = InterviewRequest {
        id: RequestId(fresh_id(now, |id| {
            snapshot.requests.iter().any(|r| r.id.0 == id)
        })),
        company_id: company.id.clone(),
        company_name: company.name.clone(),
        student_index: student.index.clone(),
        student_name: student.name.clone(),
        request_date: now,
    };
    snapshot.requests.push(request.clone());
    if let Some(company) = snapshot.company_mut(company_id) {
        company.available_slots -= 1;
        debug!(company = %company, available_slots = company.available_slots, "slot taken");
    }
    if let Some(student) = snapshot.student_mut(index) {
        student.remaining_requests -= 1;
        *cached_remaining = student.remaining_requests;
    }
    info!(
        student = %request.student_index,
        company = %request.company_id,
        request = %request.id,
        "interview request granted"
    );
    Ok(request)
}

pub fn register_student(
    snapshot: &mut Snapshot,
    index: &str,
    name: &str,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> BookingResult<Student> {
    let all_required = || BookingError::Validation("all fields are required".to_owned());
    let index = required(index, "index").map_err(|_| all_required())?;
    let name = required(name, "name").map_err(|_| all_required())?;
    let email = required(email, "email").map_err(|_| all_required())?;
    if password.is_empty() {
        return Err(all_required());
    }
    let index = StudentIndex(index);
    if !index.is_well_formed() {
        return Err(BookingError::Validation(format!(
            "invalid index number format {index}, expected something like 202601A"
        )));
    }
    if snapshot.student(&index).is_some() {
        return Err(BookingError::Duplicate(format!(
            "index number {index} is already registered"
        )));
    }
    let student = Student {
        index,
        name,
        email,
        password: password.to_owned(),
        remaining_requests: INITIAL_REQUESTS,
        registration_date: now,
    };
    info!(student = %student, "student registered");
    snapshot.students.push(student.clone());
    Ok(student)
}

pub fn authenticate_student<'a>(
    snapshot: &'a Snapshot,
    credentials: &dyn CredentialCheck,
    index: &str,
    password: &str,
) -> BookingResult<&'a Student> {
    snapshot
        .student(&StudentIndex::from(index.trim()))
        .filter(|s| credentials.student_matches(s, password))
        .ok_or_else(|| BookingError::Auth("invalid index number or password".to_owned()))
}

pub fn authenticate_admin(
    credentials: &dyn CredentialCheck,
    username: &str,
    password: &str,
) -> BookingResult<CurrentUser> {
    if credentials.admin_matches(username.trim(), password) {
        Ok(CurrentUser::admin())
    } else {
        Err(BookingError::Auth("invalid admin credentials".to_owned()))
    }
}
