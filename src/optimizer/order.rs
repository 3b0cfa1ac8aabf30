//! Processing order for eligible tasks.
//!
//! Priority descending, then deadline ascending (no deadline sorts last),
//! then estimated effort ascending. Tasks equal on all three keep their
//! input order.

use crate::model::EligibleTask;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Composite comparison used to order tasks before assignment.
pub fn compare(a: &EligibleTask, b: &EligibleTask) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| compare_deadline(a.deadline.as_ref(), b.deadline.as_ref()))
        .then_with(|| a.estimated_effort.cmp(&b.estimated_effort))
}

/// Earlier deadlines first; a missing deadline is treated as +infinity.
fn compare_deadline(a: Option<&DateTime<Utc>>, b: Option<&DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort in place. `sort_by` is stable, which keeps true duplicates in
/// input order.
pub fn sort_for_assignment(tasks: &mut [&EligibleTask]) {
    tasks.sort_by(|a, b| compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, TaskId};
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()
    }

    #[test]
    fn missing_deadline_sorts_after_any_deadline() {
        let late = EligibleTask::new(TaskId(1), Priority::Medium).deadline(at(28));
        let none = EligibleTask::new(TaskId(2), Priority::Medium);
        assert_eq!(compare(&late, &none), Ordering::Less);
        assert_eq!(compare(&none, &late), Ordering::Greater);
    }

    #[test]
    fn priority_outranks_deadline_and_effort() {
        let high = EligibleTask::new(TaskId(1), Priority::High).effort(40);
        let urgent_low = EligibleTask::new(TaskId(2), Priority::Low)
            .deadline(at(1))
            .effort(1);
        assert_eq!(compare(&high, &urgent_low), Ordering::Less);
    }

    #[test]
    fn effort_breaks_remaining_ties() {
        let small = EligibleTask::new(TaskId(1), Priority::Low).deadline(at(5)).effort(2);
        let big = EligibleTask::new(TaskId(2), Priority::Low).deadline(at(5)).effort(8);
        assert_eq!(compare(&small, &big), Ordering::Less);
    }

    #[test]
    fn identical_keys_keep_input_order() {
        let a = EligibleTask::new(TaskId(7), Priority::High).effort(3);
        let b = EligibleTask::new(TaskId(3), Priority::High).effort(3);
        let c = EligibleTask::new(TaskId(5), Priority::High).effort(3);
        let mut refs = vec![&a, &b, &c];
        sort_for_assignment(&mut refs);
        let ids: Vec<_> = refs.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![TaskId(7), TaskId(3), TaskId(5)]);
    }
}
