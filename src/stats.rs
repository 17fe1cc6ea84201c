use crate::model::Snapshot;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    pub companies: usize,
    pub total_slots: u64,
    pub used_slots: u64,
    pub full_companies: usize,
    pub requests: usize,
    pub students: usize,
    pub exhausted_students: usize,
}

pub fn summary(snapshot: &Snapshot) -> Summary {
    Summary {
        companies: snapshot.companies.len(),
        total_slots: snapshot
            .companies
            .iter()
            .map(|c| u64::from(c.total_slots))
            .sum(),
        used_slots: snapshot
            .companies
            .iter()
            .map(|c| u64::from(c.used_slots()))
            .sum(),
        full_companies: snapshot.filter_companies(|c| !c.has_free_slot()).len(),
        requests: snapshot.requests.len(),
        students: snapshot.students.len(),
        exhausted_students: snapshot
            .students
            .iter()
            .filter(|s| !s.has_requests_left())
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Company, CompanyId};

    fn company(id: &str, total_slots: u32, available_slots: u32) -> Company {
        Company {
            id: CompanyId::from(id),
            name: format!("Company {id}"),
            description: String::new(),
            total_slots,
            available_slots,
        }
    }

    #[test]
    fn test_slot_totals_do_not_overflow() {
        let snapshot = Snapshot::new(
            vec![company("1", u32::MAX, 0), company("2", 2, 1)],
            Vec::new(),
            Vec::new(),
        );
        let summary = summary(&snapshot);
        assert_eq!(summary.total_slots, u64::from(u32::MAX) + 2);
        assert_eq!(summary.used_slots, u64::from(u32::MAX) + 1);
        assert_eq!(summary.full_companies, 1);
        assert_eq!(summary.companies, 2);
    }
}
