//! Tool for marking a habit done or undone on a date
//!
//! This module implements the habit_toggle MCP tool. The day is treated as
//! binary: toggling a done day deletes its record(s), toggling an open day
//! writes one record at local midnight. A punchcard-enabled habit gains or
//! loses one punch whenever the store actually changes.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{plan_toggle, DomainError, Session, ToggleAction};
use crate::storage::HabitStorage;
use crate::tools::{parse_date, parse_habit_id, ToolError};

/// Parameters for toggling a habit on a date
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ToggleHabitParams {
    /// ID of the habit to toggle
    pub habit_id: String,
    /// Date to toggle (YYYY-MM-DD, optional - defaults to today)
    pub date: Option<String>,
    /// What the caller sees for that date. Defaults to what is stored.
    pub is_currently_completed: Option<bool>,
}

/// Response from a toggle
#[derive(Debug, Serialize)]
pub struct ToggleHabitResponse {
    pub habit_id: String,
    pub date: NaiveDate,
    /// Whether the date is now completed
    pub completed: bool,
    /// False when the store already matched the requested state
    pub changed: bool,
    /// Punchcard counter after the toggle, if the habit has a punchcard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punchcard_current: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punchcard_target: Option<u32>,
    pub message: String,
}

/// Toggle a habit's completion for one date
pub fn toggle_habit<S: HabitStorage>(
    storage: &S,
    session: &Session,
    today: NaiveDate,
    params: ToggleHabitParams,
) -> Result<ToggleHabitResponse, ToolError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let date = parse_date(params.date.as_deref(), today)?;

    if date > today {
        return Err(DomainError::InvalidDate(format!(
            "Cannot toggle a future date ({}). Today is {}",
            date, today
        ))
        .into());
    }

    let mut habit = storage.get_habit(&session.user_id, &habit_id)?.habit;

    let has_record = storage.has_completion_on(&habit_id, date)?;
    let plan = plan_toggle(
        &habit_id,
        date,
        params.is_currently_completed.unwrap_or(has_record),
        has_record,
    );

    let changed = match &plan.action {
        ToggleAction::Insert(completion) => {
            storage.insert_completion(completion)?;
            true
        }
        ToggleAction::Remove(day) => storage.delete_completions_on(&habit_id, *day)? > 0,
        ToggleAction::Unchanged => false,
    };

    if changed && habit.punchcard.enabled && plan.punchcard_delta != 0 {
        habit.punchcard.current = habit.punchcard.adjusted(plan.punchcard_delta);
        storage.save_punchcard(&habit_id, &habit.punchcard)?;
    }

    let (punchcard_current, punchcard_target) = if habit.punchcard.enabled {
        (Some(habit.punchcard.current), Some(habit.punchcard.target))
    } else {
        (None, None)
    };

    let mut message = match (plan.new_state, changed) {
        (true, true) => format!("✅ Marked '{}' done for {}", habit.name, date),
        (false, true) => format!("↩️ Marked '{}' not done for {}", habit.name, date),
        (true, false) => format!("'{}' was already done for {}", habit.name, date),
        (false, false) => format!("'{}' was already open for {}", habit.name, date),
    };
    if let (Some(current), Some(target)) = (punchcard_current, punchcard_target) {
        message.push_str(&format!("\n🎟️ Punchcard: {}/{}", current, target));
        if habit.punchcard.is_full() {
            message.push_str(" - full! Claim your reward with punchcard_claim");
        }
    }

    tracing::debug!(
        "Toggled habit {} on {}: completed={} changed={}",
        habit_id,
        date,
        plan.new_state,
        changed
    );

    Ok(ToggleHabitResponse {
        habit_id: habit_id.to_string(),
        date,
        completed: plan.new_state,
        changed,
        punchcard_current,
        punchcard_target,
        message,
    })
}
