//! Running load table for one optimization run.
//!
//! Minimum-load selection is a binary heap keyed by `(load, user_id)`, so the
//! lowest user id wins ties. Entries are never updated in place: a change
//! pushes a fresh entry and stale ones are discarded when they surface.

use crate::model::{CandidateUser, Load, UserId};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

#[derive(Debug)]
pub struct LoadTable {
    loads: BTreeMap<UserId, Load>,
    heap: BinaryHeap<Reverse<(Load, UserId)>>,
}

impl LoadTable {
    /// Build the table from a workload snapshot.
    ///
    /// Returns the ids that appeared more than once; the first occurrence of
    /// each id is kept.
    pub fn from_snapshot(users: &[CandidateUser]) -> (Self, Vec<UserId>) {
        let mut loads = BTreeMap::new();
        let mut duplicates = Vec::new();
        for user in users {
            if loads.contains_key(&user.id) {
                duplicates.push(user.id);
                continue;
            }
            loads.insert(user.id, user.current_load);
        }

        let heap = loads
            .iter()
            .map(|(&id, &load)| Reverse((load, id)))
            .collect();

        (Self { loads, heap }, duplicates)
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.loads.contains_key(&user)
    }

    pub fn load_of(&self, user: UserId) -> Option<Load> {
        self.loads.get(&user).copied()
    }

    /// Remove `amount` from a user's load, saturating at zero.
    ///
    /// Used when a task is pulled off its current assignee for rebalancing.
    pub fn release(&mut self, user: UserId, amount: Load) {
        if amount == 0 {
            return;
        }
        if let Some(load) = self.loads.get_mut(&user) {
            *load = load.saturating_sub(amount);
            self.heap.push(Reverse((*load, user)));
        }
    }

    /// Give `amount` to the least-loaded user and return that user with
    /// their new load.
    ///
    /// Returns `None` only when the table is empty.
    pub fn assign(&mut self, amount: Load) -> Option<(UserId, Load)> {
        let user = self.pop_min()?;
        let load = self.loads.get_mut(&user)?;
        *load = load.saturating_add(amount);
        let new_load = *load;
        self.heap.push(Reverse((new_load, user)));
        Some((user, new_load))
    }

    fn pop_min(&mut self) -> Option<UserId> {
        while let Some(Reverse((load, user))) = self.heap.pop() {
            if self.loads.get(&user) == Some(&load) {
                return Some(user);
            }
        }
        None
    }

    /// Final loads, ordered by user id.
    pub fn into_loads(self) -> BTreeMap<UserId, Load> {
        self.loads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users(loads: &[(i64, Load)]) -> Vec<CandidateUser> {
        loads
            .iter()
            .map(|&(id, load)| CandidateUser::new(UserId(id), load))
            .collect()
    }

    #[test]
    fn lowest_id_wins_on_equal_load() {
        let (mut table, _) = LoadTable::from_snapshot(&users(&[(9, 0), (2, 0), (5, 0)]));
        assert_eq!(table.assign(1), Some((UserId(2), 1)));
        assert_eq!(table.assign(1), Some((UserId(5), 1)));
        assert_eq!(table.assign(1), Some((UserId(9), 1)));
        assert_eq!(table.assign(1), Some((UserId(2), 2)));
    }

    #[test]
    fn duplicate_ids_keep_first_snapshot() {
        let (table, dups) = LoadTable::from_snapshot(&users(&[(1, 4), (1, 0), (2, 1)]));
        assert_eq!(dups, vec![UserId(1)]);
        assert_eq!(table.load_of(UserId(1)), Some(4));
    }

    #[test]
    fn release_makes_user_eligible_again() {
        let (mut table, _) = LoadTable::from_snapshot(&users(&[(1, 5), (2, 3)]));
        table.release(UserId(1), 4);
        assert_eq!(table.load_of(UserId(1)), Some(1));
        assert_eq!(table.assign(2), Some((UserId(1), 3)));
        // Both at 3 now; lowest id again.
        assert_eq!(table.assign(1), Some((UserId(1), 4)));
    }

    #[test]
    fn release_saturates_at_zero() {
        let (mut table, _) = LoadTable::from_snapshot(&users(&[(1, 2)]));
        table.release(UserId(1), 10);
        assert_eq!(table.load_of(UserId(1)), Some(0));
    }

    #[test]
    fn empty_table_assigns_nobody() {
        let (mut table, _) = LoadTable::from_snapshot(&[]);
        assert_eq!(table.assign(1), None);
    }
}
