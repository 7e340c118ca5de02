use crate::analytics::{Summary, ViewMode};
use crate::dates::{DateKey, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub days: BTreeSet<Weekday>,
}

impl Habit {
    pub fn is_scheduled_on(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }
}

/// Caller input for creating or replacing a habit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HabitDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub days: Vec<Weekday>,
    /// Schedule on all seven days, ignoring `days`.
    #[serde(default)]
    pub every_day: bool,
}

impl HabitDraft {
    pub fn new(name: impl Into<String>, days: impl IntoIterator<Item = Weekday>) -> Self {
        Self {
            name: name.into(),
            days: days.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub habit_id: String,
    #[serde(default)]
    pub date: Option<DateKey>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub habit_id: String,
    pub date: DateKey,
    pub completed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletedOnResponse {
    pub date: DateKey,
    pub habit_ids: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaItem {
    pub habit: Habit,
    pub scheduled: bool,
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct AgendaQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgendaResponse {
    pub date: DateKey,
    pub items: Vec<AgendaItem>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub mode: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub mode: ViewMode,
    pub key: DateKey,
    #[serde(flatten)]
    pub summary: Summary,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub mode: Option<String>,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LabelsResponse {
    pub mode: ViewMode,
    pub labels: Vec<DateKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: DateKey,
    #[serde(flatten)]
    pub summary: Summary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChartResponse {
    pub mode: ViewMode,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    pub mode: Option<String>,
    pub index: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewResponse {
    pub mode: ViewMode,
    pub index: usize,
    pub labels: Vec<DateKey>,
    pub key: DateKey,
    #[serde(flatten)]
    pub summary: Summary,
}
