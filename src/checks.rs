use crate::model::*;
use eyre::{Result, bail};
use std::collections::HashSet;
use std::fmt;

/// A broken cross-collection invariant found in stored data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Violation {
    SlotsOutOfRange {
        company: CompanyId,
    },
    SlotAccounting {
        company: CompanyId,
        used_slots: u32,
        requests: usize,
    },
    QuotaAccounting {
        student: StudentIndex,
        used_requests: u32,
        requests: usize,
    },
    DuplicateRequest {
        student: StudentIndex,
        company: CompanyId,
    },
    UnknownCompany {
        request: RequestId,
    },
    UnknownStudent {
        request: RequestId,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::SlotsOutOfRange { company } => {
                write!(f, "company {company} has more available than total slots")
            }
            Violation::SlotAccounting {
                company,
                used_slots,
                requests,
            } => write!(
                f,
                "company {company} has {used_slots} used slots but {requests} requests"
            ),
            Violation::QuotaAccounting {
                student,
                used_requests,
                requests,
            } => write!(
                f,
                "student {student} has used {used_requests} requests but made {requests}"
            ),
            Violation::DuplicateRequest { student, company } => write!(
                f,
                "student {student} requested company {company} more than once"
            ),
            Violation::UnknownCompany { request } => {
                write!(f, "request {request} refers to an unknown company")
            }
            Violation::UnknownStudent { request } => {
                write!(f, "request {request} refers to an unknown student")
            }
        }
    }
}

pub fn verify(snapshot: &Snapshot) -> Vec<Violation> {
    let mut violations = Vec::new();
    for company in &snapshot.companies {
        if company.available_slots > company.total_slots {
            violations.push(Violation::SlotsOutOfRange {
                company: company.id.clone(),
            });
        }
        let requests = snapshot.requests_for(&company.id).len();
        if company.used_slots() as usize != requests {
            violations.push(Violation::SlotAccounting {
                company: company.id.clone(),
                used_slots: company.used_slots(),
                requests,
            });
        }
    }
    for student in &snapshot.students {
        let requests = snapshot.requests_by(&student.index).len();
        if student.remaining_requests > INITIAL_REQUESTS
            || student.used_requests() as usize != requests
        {
            violations.push(Violation::QuotaAccounting {
                student: student.index.clone(),
                used_requests: student.used_requests(),
                requests,
            });
        }
    }
    let mut seen = HashSet::new();
    for request in &snapshot.requests {
        if !seen.insert((&request.student_index, &request.company_id)) {
            violations.push(Violation::DuplicateRequest {
                student: request.student_index.clone(),
                company: request.company_id.clone(),
            });
        }
        if snapshot.company(&request.company_id).is_none() {
            violations.push(Violation::UnknownCompany {
                request: request.id.clone(),
            });
        }
        if snapshot.student(&request.student_index).is_none() {
            violations.push(Violation::UnknownStudent {
                request: request.id.clone(),
            });
        }
    }
    violations
}

pub fn ensure_consistent(snapshot: &Snapshot) -> Result<()> {
    let violations = verify(snapshot);
    if let Some(first) = violations.first() {
        bail!(
            "{} invariant violation(s) in stored data, first one: {}",
            violations.len(),
            first
        );
    }
    Ok(())
}
