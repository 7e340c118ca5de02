use crate::dates::DateKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type CompletionMap = BTreeMap<DateKey, BTreeSet<String>>;

/// Per-date sets of completed habit ids.
///
/// A date with no completions is never stored, so "absent" and "empty" are
/// the same thing to every reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionLedger {
    days: CompletionMap,
}

impl CompletionLedger {
    pub fn new(days: CompletionMap) -> Self {
        let mut ledger = Self { days };
        ledger.days.retain(|_, ids| !ids.is_empty());
        ledger
    }

    pub fn entries(&self) -> &CompletionMap {
        &self.days
    }

    /// Flips membership of `habit_id` on `date` and returns the new state.
    pub fn toggle(&mut self, habit_id: &str, date: DateKey) -> bool {
        let ids = self.days.entry(date).or_default();
        let completed = if ids.remove(habit_id) {
            false
        } else {
            ids.insert(habit_id.to_string());
            true
        };
        if ids.is_empty() {
            self.days.remove(&date);
        }
        completed
    }

    pub fn is_complete(&self, habit_id: &str, date: DateKey) -> bool {
        self.days
            .get(&date)
            .is_some_and(|ids| ids.contains(habit_id))
    }

    pub fn completed_on(&self, date: DateKey) -> BTreeSet<String> {
        self.days.get(&date).cloned().unwrap_or_default()
    }

    /// Removes `habit_id` from every date. Returns how many dates referenced it.
    pub fn purge_habit(&mut self, habit_id: &str) -> usize {
        let mut purged = 0;
        self.days.retain(|_, ids| {
            if ids.remove(habit_id) {
                purged += 1;
            }
            !ids.is_empty()
        });
        purged
    }

    /// Drops ids for which `keep` returns false. Returns the number removed.
    pub fn retain_habits(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let mut removed = 0;
        self.days.retain(|_, ids| {
            let before = ids.len();
            ids.retain(|id| keep(id.as_str()));
            removed += before - ids.len();
            !ids.is_empty()
        });
        removed
    }

    pub fn reset(&mut self) {
        self.days.clear();
    }
}
