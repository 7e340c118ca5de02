//! The habit tracking session.
//!
//! `HabitTracker` owns the habit store, the completion ledger and the view
//! selection for one application session. Mutations apply in memory first and
//! then hand a full snapshot to the [`Persister`]; reads always see memory.

use crate::analytics::{self, Summary, ViewMode, ViewSelection};
use crate::dates::{Clock, DateKey};
use crate::errors::TrackerError;
use crate::habits::HabitStore;
use crate::ledger::{CompletionLedger, CompletionMap};
use crate::models::{AgendaItem, ChartPoint, Habit, HabitDraft};
use crate::storage::{KeyValueStore, PersistenceGateway, Persister, Snapshot};
use chrono::Utc;
use std::{collections::BTreeSet, sync::Arc};
use tracing::{debug, error, info, warn};

pub struct HabitTracker {
    habits: HabitStore,
    ledger: CompletionLedger,
    selection: ViewSelection,
    clock: Arc<dyn Clock>,
    persister: Persister,
}

/// The current view selection resolved against store state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedWindow {
    pub mode: ViewMode,
    pub index: usize,
    pub labels: Vec<DateKey>,
    pub key: DateKey,
    pub summary: Summary,
}

impl HabitTracker {
    /// Starts a session over loaded state, dropping (and re-persisting the
    /// ledger without) completions whose habit is unknown.
    pub fn new(
        habits: Vec<Habit>,
        completions: CompletionMap,
        clock: Arc<dyn Clock>,
        persister: Persister,
        window_count: usize,
    ) -> Self {
        let mut tracker = Self::assemble(habits, completions, clock, persister, window_count);
        let stale = tracker
            .ledger
            .retain_habits(|id| tracker.habits.contains(id));
        if stale > 0 {
            warn!(stale, "dropped completions referencing unknown habits");
            tracker.save_completions();
        }
        tracker
    }

    fn assemble(
        habits: Vec<Habit>,
        completions: CompletionMap,
        clock: Arc<dyn Clock>,
        persister: Persister,
        window_count: usize,
    ) -> Self {
        Self {
            habits: HabitStore::new(habits),
            ledger: CompletionLedger::new(completions),
            selection: ViewSelection::new(window_count),
            clock,
            persister,
        }
    }

    /// Loads both collections through `gateway` and starts its writer task.
    /// Load failures start the session empty. Unreadable habits also leave the
    /// stored completions alone: nothing is purged or rewritten until the
    /// first mutation.
    pub async fn open<S: KeyValueStore>(
        gateway: PersistenceGateway<S>,
        clock: Arc<dyn Clock>,
        window_count: usize,
    ) -> Self {
        let habits = match gateway.load_habits().await {
            Ok(habits) => habits,
            Err(err) => {
                error!("failed to load habits: {err}");
                let persister = Persister::spawn(gateway);
                let completions = CompletionMap::new();
                return Self::assemble(Vec::new(), completions, clock, persister, window_count);
            }
        };
        let completions = gateway.load_completions_or_default().await;
        info!(
            habits = habits.len(),
            dates = completions.len(),
            "habit tracker session opened"
        );
        let persister = Persister::spawn(gateway);
        Self::new(habits, completions, clock, persister, window_count)
    }

    pub fn persister(&self) -> &Persister {
        &self.persister
    }

    pub fn today(&self) -> DateKey {
        DateKey::new(self.clock.today())
    }

    pub fn habits(&self) -> &[Habit] {
        self.habits.list()
    }

    pub fn habit(&self, id: &str) -> Option<&Habit> {
        self.habits.get(id)
    }

    pub fn completions(&self) -> &CompletionMap {
        self.ledger.entries()
    }

    pub fn add_habit(&mut self, draft: HabitDraft) -> Result<Habit, TrackerError> {
        let habit = self.habits.add(draft, Utc::now().timestamp_millis())?;
        info!(id = %habit.id, name = %habit.name, "habit added");
        self.save_habits();
        Ok(habit)
    }

    pub fn update_habit(&mut self, id: &str, draft: HabitDraft) -> Result<Habit, TrackerError> {
        let habit = self.habits.update(id, draft)?;
        info!(id = %habit.id, name = %habit.name, "habit updated");
        self.save_habits();
        Ok(habit)
    }

    /// Deletes a habit and every completion recorded for it.
    pub fn delete_habit(&mut self, id: &str) -> Result<Habit, TrackerError> {
        let habit = self.habits.delete(id)?;
        let purged = self.ledger.purge_habit(id);
        info!(id, purged, "habit deleted");
        self.save_habits();
        self.save_completions();
        Ok(habit)
    }

    /// Flips completion of `habit_id` on `date` and returns the new state.
    /// The habit does not need to be scheduled on that date.
    pub fn toggle_habit_complete(
        &mut self,
        habit_id: &str,
        date: DateKey,
    ) -> Result<bool, TrackerError> {
        if !self.habits.contains(habit_id) {
            return Err(TrackerError::NotFound(habit_id.to_string()));
        }
        let completed = self.ledger.toggle(habit_id, date);
        info!(habit_id, %date, completed, "completion toggled");
        self.save_completions();
        Ok(completed)
    }

    pub fn is_complete(&self, habit_id: &str, date: DateKey) -> bool {
        self.ledger.is_complete(habit_id, date)
    }

    pub fn completed_on(&self, date: DateKey) -> BTreeSet<String> {
        self.ledger.completed_on(date)
    }

    pub fn reset_completions(&mut self) {
        self.ledger.reset();
        info!("completion ledger reset");
        self.save_completions();
    }

    /// Every habit with its schedule and completion state for `date`.
    pub fn agenda(&self, date: DateKey) -> Vec<AgendaItem> {
        let weekday = date.weekday();
        self.habits
            .list()
            .iter()
            .map(|habit| AgendaItem {
                scheduled: habit.is_scheduled_on(weekday),
                completed: self.ledger.is_complete(&habit.id, date),
                habit: habit.clone(),
            })
            .collect()
    }

    pub fn summary(&self, mode: ViewMode, key: DateKey) -> Summary {
        let summary = analytics::summarize(self.habits.list(), &self.ledger, mode, key);
        debug!(%mode, %key, ?summary, "summary computed");
        summary
    }

    /// Window labels for `mode`, most recent first.
    pub fn labels(&self, mode: ViewMode, count: usize) -> Vec<DateKey> {
        analytics::window_labels(mode, self.clock.today(), count)
    }

    /// The most recent window label for `mode`.
    pub fn current_window(&self, mode: ViewMode) -> DateKey {
        self.labels(mode, 1)
            .first()
            .copied()
            .unwrap_or_else(|| self.today())
    }

    pub fn chart(&self, mode: ViewMode, count: usize) -> Vec<ChartPoint> {
        analytics::chart(
            self.habits.list(),
            &self.ledger,
            mode,
            self.clock.today(),
            count,
        )
    }

    pub fn window_count(&self) -> usize {
        self.selection.window_count()
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.selection.set_mode(mode);
    }

    pub fn select_window(&mut self, index: usize) -> Result<(), TrackerError> {
        self.selection.select(index)
    }

    pub fn change_view(
        &mut self,
        mode: Option<ViewMode>,
        index: Option<usize>,
    ) -> Result<(), TrackerError> {
        self.selection.apply(mode, index)
    }

    pub fn selected_window(&self) -> SelectedWindow {
        let labels = self.selection.labels(self.clock.today());
        let mode = self.selection.mode();
        let index = self.selection.index();
        let key = labels
            .get(index)
            .copied()
            .unwrap_or_else(|| self.current_window(mode));
        SelectedWindow {
            mode,
            index,
            key,
            summary: self.summary(mode, key),
            labels,
        }
    }

    fn save_habits(&self) {
        self.persister.save(Snapshot::Habits(self.habits.list().to_vec()));
    }

    fn save_completions(&self) {
        self.persister.save(Snapshot::Completions(self.ledger.entries().clone()));
    }
}
