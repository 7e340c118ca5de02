use crate::analytics::{MAX_WINDOW_COUNT, ViewMode};
use crate::dates::DateKey;
use crate::errors::{AppError, TrackerError};
use crate::ledger::CompletionMap;
use crate::models::{
    AgendaQuery, AgendaResponse, ChartResponse, CompletedOnResponse, Habit, HabitDraft,
    LabelsResponse, SummaryQuery, SummaryResponse, ToggleRequest, ToggleResponse, ViewRequest,
    ViewResponse, WindowQuery,
};
use crate::state::AppState;
use crate::tracker::HabitTracker;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

pub async fn list_habits(State(state): State<AppState>) -> Json<Vec<Habit>> {
    let tracker = state.tracker.lock().await;
    Json(tracker.habits().to_vec())
}

pub async fn create_habit(
    State(state): State<AppState>,
    Json(draft): Json<HabitDraft>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    let mut tracker = state.tracker.lock().await;
    let habit = tracker.add_habit(draft)?;
    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn get_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Habit>, AppError> {
    let tracker = state.tracker.lock().await;
    let habit = tracker
        .habit(&id)
        .cloned()
        .ok_or(TrackerError::NotFound(id))?;
    Ok(Json(habit))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<HabitDraft>,
) -> Result<Json<Habit>, AppError> {
    let mut tracker = state.tracker.lock().await;
    Ok(Json(tracker.update_habit(&id, draft)?))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Habit>, AppError> {
    let mut tracker = state.tracker.lock().await;
    Ok(Json(tracker.delete_habit(&id)?))
}

pub async fn toggle_completion(
    State(state): State<AppState>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, AppError> {
    let mut tracker = state.tracker.lock().await;
    let date = payload.date.unwrap_or_else(|| tracker.today());
    let completed = tracker.toggle_habit_complete(&payload.habit_id, date)?;
    Ok(Json(ToggleResponse {
        habit_id: payload.habit_id,
        date,
        completed,
    }))
}

pub async fn list_completions(State(state): State<AppState>) -> Json<CompletionMap> {
    let tracker = state.tracker.lock().await;
    Json(tracker.completions().clone())
}

pub async fn completed_on(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<CompletedOnResponse>, AppError> {
    let date: DateKey = date.parse()?;
    let tracker = state.tracker.lock().await;
    Ok(Json(CompletedOnResponse {
        date,
        habit_ids: tracker.completed_on(date),
    }))
}

pub async fn reset_completions(State(state): State<AppState>) -> StatusCode {
    state.tracker.lock().await.reset_completions();
    StatusCode::NO_CONTENT
}

pub async fn agenda(
    State(state): State<AppState>,
    Query(query): Query<AgendaQuery>,
) -> Result<Json<AgendaResponse>, AppError> {
    let tracker = state.tracker.lock().await;
    let date = match query.date {
        Some(raw) => raw.parse::<DateKey>()?,
        None => tracker.today(),
    };
    Ok(Json(AgendaResponse {
        date,
        items: tracker.agenda(date),
    }))
}

pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    let mode = parse_mode(query.mode.as_deref())?;
    let tracker = state.tracker.lock().await;
    let key = match query.key {
        Some(raw) => raw.parse::<DateKey>()?,
        None => tracker.current_window(mode),
    };
    Ok(Json(SummaryResponse {
        mode,
        key,
        summary: tracker.summary(mode, key),
    }))
}

pub async fn labels(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<LabelsResponse>, AppError> {
    let mode = parse_mode(query.mode.as_deref())?;
    let tracker = state.tracker.lock().await;
    let count = window_count(&tracker, query.count)?;
    Ok(Json(LabelsResponse {
        mode,
        labels: tracker.labels(mode, count),
    }))
}

pub async fn chart(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ChartResponse>, AppError> {
    let mode = parse_mode(query.mode.as_deref())?;
    let tracker = state.tracker.lock().await;
    let count = window_count(&tracker, query.count)?;
    Ok(Json(ChartResponse {
        mode,
        points: tracker.chart(mode, count),
    }))
}

pub async fn get_view(State(state): State<AppState>) -> Json<ViewResponse> {
    let tracker = state.tracker.lock().await;
    Json(view_response(&tracker))
}

pub async fn update_view(
    State(state): State<AppState>,
    Json(payload): Json<ViewRequest>,
) -> Result<Json<ViewResponse>, AppError> {
    let mode = payload.mode.as_deref().map(str::parse::<ViewMode>).transpose()?;
    let mut tracker = state.tracker.lock().await;
    tracker.change_view(mode, payload.index)?;
    Ok(Json(view_response(&tracker)))
}

fn view_response(tracker: &HabitTracker) -> ViewResponse {
    let selected = tracker.selected_window();
    ViewResponse {
        mode: selected.mode,
        index: selected.index,
        labels: selected.labels,
        key: selected.key,
        summary: selected.summary,
    }
}

fn parse_mode(raw: Option<&str>) -> Result<ViewMode, TrackerError> {
    raw.map_or(Ok(ViewMode::Daily), str::parse)
}

fn window_count(tracker: &HabitTracker, requested: Option<usize>) -> Result<usize, TrackerError> {
    let count = requested.unwrap_or_else(|| tracker.window_count());
    if count == 0 || count > MAX_WINDOW_COUNT {
        return Err(TrackerError::validation(format!(
            "count must be between 1 and {MAX_WINDOW_COUNT}"
        )));
    }
    Ok(count)
}
