//! Tool for the week grid
//!
//! This module implements the habit_week MCP tool: per-day completion marks
//! for a Monday-start week, the week's punchcard stats and its punch holes.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsEngine, WeekView};
use crate::domain::{week_start, Session};
use crate::storage::HabitStorage;
use crate::tools::{history_start, parse_date, ToolError};

/// Parameters for the week grid
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct WeekParams {
    /// Any date inside the week to show (YYYY-MM-DD, optional - defaults to this week)
    pub date: Option<String>,
}

/// Response carrying the week grid
#[derive(Debug, Serialize)]
pub struct WeekResponse {
    pub week: WeekView,
    pub message: String,
}

pub fn get_week<S: HabitStorage>(
    storage: &S,
    analytics: &AnalyticsEngine,
    session: &Session,
    today: NaiveDate,
    params: WeekParams,
) -> Result<WeekResponse, ToolError> {
    let date = parse_date(params.date.as_deref(), today)?;
    let since = history_start(today).min(week_start(date));

    let habits = storage.list_habits(&session.user_id, true)?;
    let completions = storage.completions_for_user(&session.user_id, since)?;
    let week = analytics.week_view(&habits, &completions, date, today);

    let mut lines = vec![format!(
        "🗓️ Week of {} | {}/{} punched",
        week.week_start.format("%-d %b %Y"),
        week.stats.completed,
        week.stats.total_scheduled
    )];
    for row in &week.habits {
        let cells: String = row
            .days
            .iter()
            .map(|d| match (d.is_due, d.completed) {
                (_, true) => '●',
                (true, false) => '○',
                (false, false) => '·',
            })
            .collect();
        lines.push(format!("{} {} 🔥{}", cells, row.habit.habit.name, row.current_streak));
    }
    let holes: String = week
        .holes
        .iter()
        .map(|h| if h.completed { '●' } else { '○' })
        .collect();
    if !holes.is_empty() {
        lines.push(format!("Punchcard: {}", holes));
    }

    tracing::debug!("Built week view for {}", week.week_start);

    Ok(WeekResponse {
        message: lines.join("\n"),
        week,
    })
}
