//! Tools for checking habit status and streaks
//!
//! This module implements the habit_status and habit_today MCP tools.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsEngine, HabitWithStatus};
use crate::domain::{FrequencyType, Session};
use crate::storage::HabitStorage;
use crate::tools::{history_start, parse_habit_id, ToolError};

/// Parameters for checking habit status
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct StatusParams {
    /// ID of a specific habit (optional - shows all active habits if omitted)
    pub habit_id: Option<String>,
    /// Include archived habits when listing all
    #[serde(default)]
    pub include_archived: bool,
}

/// Response carrying habit statuses
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub today: NaiveDate,
    pub habits: Vec<HabitWithStatus>,
    pub message: String,
}

/// Status, quota and streaks for one habit or all of them
pub fn get_habit_status<S: HabitStorage>(
    storage: &S,
    analytics: &AnalyticsEngine,
    session: &Session,
    today: NaiveDate,
    params: StatusParams,
) -> Result<StatusResponse, ToolError> {
    let since = history_start(today);

    let habits = match params.habit_id.as_deref() {
        Some(raw) => {
            let habit_id = parse_habit_id(raw)?;
            let habit = storage.get_habit(&session.user_id, &habit_id)?;
            let completions = storage.completions_for_habit(&habit_id, since)?;
            vec![analytics.habit_status(&habit, &completions, today)]
        }
        None => {
            let habits = storage.list_habits(&session.user_id, !params.include_archived)?;
            let completions = storage.completions_for_user(&session.user_id, since)?;
            analytics.statuses(&habits, &completions, today)
        }
    };

    let message = if habits.is_empty() {
        "No habits found. Create your first habit to get started!".to_string()
    } else {
        habits.iter().map(status_line).collect::<Vec<_>>().join("\n")
    };

    Ok(StatusResponse { today, habits, message })
}

/// Habits due today that haven't been hidden by a met quota
pub fn get_todays_habits<S: HabitStorage>(
    storage: &S,
    analytics: &AnalyticsEngine,
    session: &Session,
    today: NaiveDate,
) -> Result<StatusResponse, ToolError> {
    let habits = storage.list_habits(&session.user_id, true)?;
    let completions = storage.completions_for_user(&session.user_id, history_start(today))?;
    let todays = analytics.todays_habits(&habits, &completions, today);

    let message = if todays.is_empty() {
        format!("🎉 Nothing left on your list for {}", today.format("%A %-d %B"))
    } else {
        let done = todays.iter().filter(|s| s.is_completed_today).count();
        format!(
            "📅 {}: {}/{} done\n{}",
            today.format("%A %-d %B"),
            done,
            todays.len(),
            todays.iter().map(status_line).collect::<Vec<_>>().join("\n")
        )
    };

    Ok(StatusResponse { today, habits: todays, message })
}

fn status_line(status: &HabitWithStatus) -> String {
    let habit = &status.habit.habit;
    let icon = status
        .habit
        .category
        .as_ref()
        .map(|c| format!("{} ", c.icon))
        .unwrap_or_default();
    let check = if status.is_completed_today { "✅" } else { "⬜" };

    let quota = match habit.schedule.frequency_type {
        FrequencyType::TimesPerWeek => {
            format!(" | {}/{} this week", status.counts.this_week, habit.schedule.frequency_value)
        }
        FrequencyType::TimesPerMonth => {
            format!(" | {}/{} this month", status.counts.this_month, habit.schedule.frequency_value)
        }
        _ => String::new(),
    };

    format!(
        "{} {}{} | 🔥 {} (best {}){}{} [{}]",
        check,
        icon,
        habit.name,
        status.current_streak,
        status.longest_streak,
        quota,
        if habit.is_active { "" } else { " 📦 archived" },
        habit.id
    )
}
