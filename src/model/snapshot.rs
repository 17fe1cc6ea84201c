use super::*;

/// In-memory copy of the three stored collections.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    pub companies: Vec<Company>,
    pub students: Vec<Student>,
    pub requests: Vec<InterviewRequest>,
}

/// Requests for one company, as shown in the administrator view.
#[derive(Debug)]
pub struct RequestGroup<'a> {
    pub company_id: &'a CompanyId,
    pub company_name: &'a str,
    pub requests: Vec<&'a InterviewRequest>,
}

impl Snapshot {
    pub fn new(
        companies: Vec<Company>,
        students: Vec<Student>,
        requests: Vec<InterviewRequest>,
    ) -> Snapshot {
        Snapshot {
            companies,
            students,
            requests,
        }
    }

    pub fn company(&self, id: &CompanyId) -> Option<&Company> {
        self.companies.iter().find(|c| &c.id == id)
    }

    pub fn company_mut(&mut self, id: &CompanyId) -> Option<&mut Company> {
        self.companies.iter_mut().find(|c| &c.id == id)
    }

    pub fn student(&self, index: &StudentIndex) -> Option<&Student> {
        self.students.iter().find(|s| &s.index == index)
    }

    pub fn student_mut(&mut self, index: &StudentIndex) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| &s.index == index)
    }

    pub fn filter_companies<F>(&self, condition: F) -> Vec<&Company>
    where
        F: Fn(&Company) -> bool,
    {
        self.companies.iter().filter(|c| condition(c)).collect()
    }

    pub fn requests_for(&self, company: &CompanyId) -> Vec<&InterviewRequest> {
        self.requests
            .iter()
            .filter(|r| &r.company_id == company)
            .collect()
    }

    pub fn requests_by(&self, student: &StudentIndex) -> Vec<&InterviewRequest> {
        self.requests
            .iter()
            .filter(|r| &r.student_index == student)
            .collect()
    }

    pub fn is_requested(&self, company: &CompanyId) -> bool {
        self.requests.iter().any(|r| &r.company_id == company)
    }

    pub fn has_requested(&self, student: &StudentIndex, company: &CompanyId) -> bool {
        self.requests.iter().any(|r| r.is_for(student, company))
    }

    /// Students sorted by registration date, newest first.
    pub fn students_by_registration(&self) -> Vec<&Student> {
        let mut students = self.students.iter().collect::<Vec<_>>();
        students.sort_by(|a, b| b.registration_date.cmp(&a.registration_date));
        students
    }

    /// Requests grouped by company, groups sorted by company name and requests
    /// newest first. The group name is the one recorded in the first request
    /// of the group.
    pub fn requests_by_company(&self) -> Vec<RequestGroup<'_>> {
        let mut groups: Vec<RequestGroup<'_>> = Vec::new();
        for request in &self.requests {
            match groups
                .iter_mut()
                .find(|g| g.company_id == &request.company_id)
            {
                Some(group) => group.requests.push(request),
                None => groups.push(RequestGroup {
                    company_id: &request.company_id,
                    company_name: &request.company_name,
                    requests: vec![request],
                }),
            }
        }
        groups.sort_by(|a, b| a.company_name.cmp(b.company_name));
        for group in &mut groups {
            group
                .requests
                .sort_by(|a, b| b.request_date.cmp(&a.request_date));
        }
        groups
    }
}
