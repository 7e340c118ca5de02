use crate::dates::Weekday;
use crate::errors::TrackerError;
use crate::models::{Habit, HabitDraft};
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

/// Ordered collection of habit definitions. Insertion order is display order.
#[derive(Debug, Clone, Default)]
pub struct HabitStore {
    habits: Vec<Habit>,
}

impl HabitStore {
    /// Builds a store from loaded habits. Later entries repeating an earlier
    /// id are dropped.
    pub fn new(mut habits: Vec<Habit>) -> Self {
        let mut seen = HashSet::new();
        habits.retain(|habit| {
            let fresh = seen.insert(habit.id.clone());
            if !fresh {
                warn!(id = %habit.id, "dropping habit with duplicate id");
            }
            fresh
        });
        Self { habits }
    }

    pub fn list(&self) -> &[Habit] {
        &self.habits
    }

    pub fn get(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Appends a habit. Without a caller id, `token` seeds a fresh one
    /// (bumped until unused).
    pub fn add(&mut self, draft: HabitDraft, token: i64) -> Result<Habit, TrackerError> {
        let (name, days) = validate(&draft)?;
        let id = match draft.id {
            Some(id) => {
                let id = id.trim().to_string();
                if id.is_empty() {
                    return Err(TrackerError::validation("habit id must not be empty"));
                }
                if self.contains(&id) {
                    return Err(TrackerError::validation(format!(
                        "habit id `{id}` already exists"
                    )));
                }
                id
            }
            None => self.fresh_id(token),
        };

        let habit = Habit { id, name, days };
        self.habits.push(habit.clone());
        Ok(habit)
    }

    /// Replaces name and days of the habit with `id`.
    pub fn update(&mut self, id: &str, draft: HabitDraft) -> Result<Habit, TrackerError> {
        let (name, days) = validate(&draft)?;
        let habit = self
            .habits
            .iter_mut()
            .find(|habit| habit.id == id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        habit.name = name;
        habit.days = days;
        Ok(habit.clone())
    }

    pub fn delete(&mut self, id: &str) -> Result<Habit, TrackerError> {
        let index = self
            .habits
            .iter()
            .position(|habit| habit.id == id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        Ok(self.habits.remove(index))
    }

    fn fresh_id(&self, token: i64) -> String {
        let mut candidate = token;
        loop {
            let id = candidate.to_string();
            if !self.contains(&id) {
                return id;
            }
            candidate = candidate.wrapping_add(1);
        }
    }
}

fn validate(draft: &HabitDraft) -> Result<(String, BTreeSet<Weekday>), TrackerError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(TrackerError::validation("habit name must not be empty"));
    }
    if draft.every_day {
        return Ok((name.to_string(), Weekday::ALL.into_iter().collect()));
    }

    let mut days = BTreeSet::new();
    for day in &draft.days {
        if !days.insert(*day) {
            return Err(TrackerError::validation(format!("{day} listed more than once")));
        }
    }
    Ok((name.to_string(), days))
}
