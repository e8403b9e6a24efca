//! Tools for updating and archiving existing habits
//!
//! This module implements the habit_update and habit_archive MCP tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{HabitChanges, HabitWithCategory, RewardSpec, Session};
use crate::storage::{HabitStorage, UserStorage};
use crate::tools::{parse_category_id, parse_habit_id, PunchcardInput, ScheduleInput, ToolError};

/// Parameters for updating an existing habit. Omitted fields are unchanged.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct UpdateHabitParams {
    pub habit_id: String,
    pub name: Option<String>,
    /// Empty string clears the description
    pub description: Option<String>,
    /// Empty string or "none" removes the habit from its category
    pub category_id: Option<String>,
    pub frequency_type: Option<String>,
    pub frequency_value: Option<u32>,
    pub scheduled_days: Option<Vec<u8>>,
    pub monthly_day_of_week: Option<u8>,
    pub monthly_week_occurrences: Option<Vec<u32>>,
    pub hide_when_quota_reached: Option<bool>,
    /// false turns the punchcard off; true (or any punchcard field) turns it on
    pub punchcard_enabled: Option<bool>,
    pub punchcard_target: Option<u32>,
    /// direct, jackpot or none
    pub reward_type: Option<String>,
    pub reward_text: Option<String>,
    pub jackpot_bag: Option<String>,
}

/// Parameters naming a single habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct HabitIdParams {
    pub habit_id: String,
}

/// Response from updating or archiving a habit
#[derive(Debug, Serialize)]
pub struct UpdateHabitResponse {
    pub habit: HabitWithCategory,
    pub message: String,
}

/// Update an existing habit
pub fn update_habit<S: HabitStorage + UserStorage>(
    storage: &S,
    session: &Session,
    params: UpdateHabitParams,
) -> Result<UpdateHabitResponse, ToolError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let HabitWithCategory { mut habit, category } = storage.get_habit(&session.user_id, &habit_id)?;

    let (category_change, category) = match params.category_id.as_deref().map(str::trim) {
        None => (None, category),
        Some("") | Some("none") => (Some(None), None),
        Some(raw) => {
            let id = parse_category_id(raw)?;
            let found = storage.get_category(&session.user_id, &id)?;
            (Some(Some(found.id.clone())), Some(found.to_ref()))
        }
    };

    let schedule_input = ScheduleInput {
        frequency_type: params.frequency_type,
        frequency_value: params.frequency_value,
        scheduled_days: params.scheduled_days,
        monthly_day_of_week: params.monthly_day_of_week,
        monthly_week_occurrences: params.monthly_week_occurrences,
    };
    let schedule = if schedule_input.is_empty() {
        None
    } else {
        Some(schedule_input.into_schedule(Some(&habit.schedule))?)
    };

    let touches_punchcard = params.punchcard_target.is_some()
        || params.reward_type.is_some()
        || params.reward_text.is_some()
        || params.jackpot_bag.is_some();
    let enable = match params.punchcard_enabled {
        None if touches_punchcard => Some(true),
        other => other,
    };
    let punchcard = match enable {
        Some(true) => {
            // reward_text or jackpot_bag alone edit the reward of the same kind
            let edits_reward = params.reward_text.is_some() || params.jackpot_bag.is_some();
            let reward_type = match (params.reward_type, &habit.punchcard.reward) {
                (Some(t), _) => Some(t),
                (None, _) if !edits_reward => None,
                (None, Some(RewardSpec::Direct { .. })) if params.jackpot_bag.is_none() => {
                    Some("direct".to_string())
                }
                (None, Some(RewardSpec::Jackpot { .. })) if params.reward_text.is_none() => {
                    Some("jackpot".to_string())
                }
                (None, _) => {
                    return Err(ToolError::InvalidParams(
                        "reward_type is required to set or change the kind of reward".to_string(),
                    ))
                }
            };
            let keep_reward = reward_type.is_none();
            let mut settings = PunchcardInput {
                target: params.punchcard_target.or(Some(habit.punchcard.target)),
                reward_type,
                reward_text: params.reward_text,
                jackpot_bag: params.jackpot_bag,
            }
            .into_settings()?;
            if keep_reward {
                settings.reward = habit.punchcard.reward.clone();
            }
            Some(Some(settings))
        }
        Some(false) => Some(None),
        None => None,
    };

    habit.update(HabitChanges {
        name: params.name,
        description: params
            .description
            .map(|d| Some(d).filter(|d| !d.trim().is_empty())),
        category_id: category_change,
        schedule,
        hide_when_quota_reached: params.hide_when_quota_reached,
        punchcard,
    })?;

    storage.update_habit(&habit)?;

    Ok(UpdateHabitResponse {
        message: format!("✅ Updated habit '{}'", habit.name),
        habit: HabitWithCategory { habit, category },
    })
}

/// Archive (soft delete) a habit. Its completions are kept.
pub fn archive_habit<S: HabitStorage>(
    storage: &S,
    session: &Session,
    params: HabitIdParams,
) -> Result<UpdateHabitResponse, ToolError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let mut found = storage.get_habit(&session.user_id, &habit_id)?;
    storage.archive_habit(&session.user_id, &habit_id)?;
    found.habit.archive();

    Ok(UpdateHabitResponse {
        message: format!("📦 Archived habit '{}'. Its history is kept.", found.habit.name),
        habit: found,
    })
}
