//! Report ordering for classified milestones
//!
//! Rows are grouped by category (Scheduled before Delayed), then ordered by
//! sort date with undated rows last in their category, then by id.

use crate::classify::ClassifiedMilestone;
use std::cmp::Ordering;

pub struct ResultSorter;

impl ResultSorter {
    /// Sort rows into report order
    pub fn sort(rows: &mut [ClassifiedMilestone]) {
        rows.sort_by(Self::compare);
    }

    pub fn compare(a: &ClassifiedMilestone, b: &ClassifiedMilestone) -> Ordering {
        a.status
            .rank()
            .cmp(&b.status.rank())
            .then_with(|| match (a.sort_date, b.sort_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| compare_ids(a.id(), b.id()))
    }
}

/// Numeric order when both ids are integers, text order otherwise
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
