//! Completion statistics over daily, weekly and monthly windows.
//!
//! Daily summaries count habits. Weekly and monthly summaries count
//! completion events: a habit scheduled on three days of a week contributes
//! three expected completions, while `total` still reports it once.

use crate::dates::{self, DateKey};
use crate::errors::TrackerError;
use crate::ledger::CompletionLedger;
use crate::models::{ChartPoint, Habit};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Daily => "daily",
            ViewMode::Weekly => "weekly",
            ViewMode::Monthly => "monthly",
        }
    }
}

impl FromStr for ViewMode {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(ViewMode::Daily),
            "weekly" => Ok(ViewMode::Weekly),
            "monthly" => Ok(ViewMode::Monthly),
            other => Err(TrackerError::validation(format!(
                "view mode must be daily, weekly or monthly, got `{other}`"
            ))),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Habits scheduled in the window, each counted once.
    pub total: u32,
    /// Completion events on scheduled days.
    pub completed: u32,
    pub pending: u32,
    /// Scheduled habit-days in the window. Equal to `total` for daily views.
    pub expected: u32,
    pub percentage: u32,
}

pub fn summarize(
    habits: &[Habit],
    ledger: &CompletionLedger,
    mode: ViewMode,
    key: DateKey,
) -> Summary {
    match mode {
        ViewMode::Daily => daily_summary(habits, ledger, key),
        ViewMode::Weekly => window_summary(habits, ledger, &key.week_dates()),
        ViewMode::Monthly => window_summary(habits, ledger, &key.month_dates()),
    }
}

fn daily_summary(habits: &[Habit], ledger: &CompletionLedger, key: DateKey) -> Summary {
    let weekday = key.weekday();
    let completed_ids = ledger.completed_on(key);

    let mut total = 0u32;
    let mut completed = 0u32;
    for habit in habits.iter().filter(|habit| habit.is_scheduled_on(weekday)) {
        total += 1;
        if completed_ids.contains(&habit.id) {
            completed += 1;
        }
    }

    Summary {
        total,
        completed,
        pending: total - completed,
        expected: total,
        percentage: percentage(completed, total),
    }
}

fn window_summary(habits: &[Habit], ledger: &CompletionLedger, dates: &[DateKey]) -> Summary {
    let mut unique = BTreeSet::new();
    let mut expected = 0u32;
    let mut actual = 0u32;

    for &date in dates {
        let weekday = date.weekday();
        let completed_ids = ledger.completed_on(date);
        for habit in habits.iter().filter(|habit| habit.is_scheduled_on(weekday)) {
            unique.insert(habit.id.as_str());
            expected += 1;
            if completed_ids.contains(&habit.id) {
                actual += 1;
            }
        }
    }

    Summary {
        total: unique.len() as u32,
        completed: actual,
        pending: expected - actual,
        expected,
        percentage: percentage(actual, expected),
    }
}

/// `round(100 * part / whole)` with halves rounded up; zero when `whole` is zero.
fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (u64::from(part), u64::from(whole));
    ((part * 200 + whole) / (whole * 2)) as u32
}

/// Window labels for `mode`, most recent first.
pub fn window_labels(mode: ViewMode, today: NaiveDate, count: usize) -> Vec<DateKey> {
    match mode {
        ViewMode::Daily => dates::past_dates(today, count),
        ViewMode::Weekly => dates::past_week_starts(today, count),
        ViewMode::Monthly => dates::past_month_starts(today, count),
    }
}

/// One summary per window label, oldest first.
pub fn chart(
    habits: &[Habit],
    ledger: &CompletionLedger,
    mode: ViewMode,
    today: NaiveDate,
    count: usize,
) -> Vec<ChartPoint> {
    window_labels(mode, today, count)
        .into_iter()
        .rev()
        .map(|label| ChartPoint {
            label,
            summary: summarize(habits, ledger, mode, label),
        })
        .collect()
}

/// Upper bound on windows per label series, chart or view selection.
pub const MAX_WINDOW_COUNT: usize = 366;

/// Which window the consumer is currently inspecting.
///
/// Index 0 is always the most recent window; changing mode resets to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSelection {
    mode: ViewMode,
    index: usize,
    window_count: usize,
}

impl ViewSelection {
    pub fn new(window_count: usize) -> Self {
        Self {
            mode: ViewMode::Daily,
            index: 0,
            window_count: window_count.clamp(1, MAX_WINDOW_COUNT),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn window_count(&self) -> usize {
        self.window_count
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
        self.index = 0;
    }

    pub fn select(&mut self, index: usize) -> Result<(), TrackerError> {
        if index >= self.window_count {
            return Err(TrackerError::validation(format!(
                "window index {index} out of range 0..{}",
                self.window_count
            )));
        }
        self.index = index;
        Ok(())
    }

    /// Applies a mode change then an index change, or neither if the index
    /// is out of range for the new mode.
    pub fn apply(
        &mut self,
        mode: Option<ViewMode>,
        index: Option<usize>,
    ) -> Result<(), TrackerError> {
        let mut next = *self;
        if let Some(mode) = mode {
            next.set_mode(mode);
        }
        if let Some(index) = index {
            next.select(index)?;
        }
        *self = next;
        Ok(())
    }

    pub fn labels(&self, today: NaiveDate) -> Vec<DateKey> {
        window_labels(self.mode, today, self.window_count)
    }
}
