//! Tool for creating new habits
//!
//! This module implements the habit_create MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{Habit, HabitDraft, HabitWithCategory, Session};
use crate::storage::{HabitStorage, UserStorage};
use crate::tools::{parse_category_id, PunchcardInput, ScheduleInput, ToolError};

/// Parameters for creating a new habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateHabitParams {
    /// Name of the habit, 1-100 characters
    pub name: String,
    pub description: Option<String>,
    /// Category to file the habit under
    pub category_id: Option<String>,
    /// daily, times_per_week, times_per_month or monthly_on_weeks (default daily)
    pub frequency_type: Option<String>,
    /// Quota for times_per_week (1-7) or times_per_month (1-31)
    pub frequency_value: Option<u32>,
    /// Weekdays the habit shows up on, 0 = Sunday .. 6 = Saturday
    pub scheduled_days: Option<Vec<u8>>,
    /// Weekday for monthly_on_weeks, 0 = Sunday .. 6 = Saturday
    pub monthly_day_of_week: Option<u8>,
    /// Which occurrences (1-4) of that weekday are due each month
    pub monthly_week_occurrences: Option<Vec<u32>>,
    /// Drop off today's list once the week/month quota is met
    #[serde(default)]
    pub hide_when_quota_reached: bool,
    #[serde(default)]
    pub punchcard_enabled: bool,
    /// Punches needed to earn the reward (1-100, default 10)
    pub punchcard_target: Option<u32>,
    /// direct or jackpot
    pub reward_type: Option<String>,
    /// Reward text for a direct reward
    pub reward_text: Option<String>,
    /// baby or baller, for a jackpot reward
    pub jackpot_bag: Option<String>,
}

/// Response from creating a habit
#[derive(Debug, Serialize)]
pub struct CreateHabitResponse {
    pub habit_id: String,
    pub habit: HabitWithCategory,
    pub message: String,
}

/// Create a new habit for the session's user
pub fn create_habit<S: HabitStorage + UserStorage>(
    storage: &S,
    session: &Session,
    params: CreateHabitParams,
) -> Result<CreateHabitResponse, ToolError> {
    let category = match params.category_id.as_deref() {
        Some(raw) => {
            let id = parse_category_id(raw)?;
            Some(storage.get_category(&session.user_id, &id)?)
        }
        None => None,
    };

    let schedule = ScheduleInput {
        frequency_type: params.frequency_type,
        frequency_value: params.frequency_value,
        scheduled_days: params.scheduled_days,
        monthly_day_of_week: params.monthly_day_of_week,
        monthly_week_occurrences: params.monthly_week_occurrences,
    }
    .into_schedule(None)?;

    let punchcard = if params.punchcard_enabled {
        Some(
            PunchcardInput {
                target: params.punchcard_target,
                reward_type: params.reward_type,
                reward_text: params.reward_text,
                jackpot_bag: params.jackpot_bag,
            }
            .into_settings()?,
        )
    } else {
        None
    };

    let mut draft = HabitDraft::new(params.name, schedule);
    draft.description = params.description.filter(|d| !d.trim().is_empty());
    draft.category_id = category.as_ref().map(|c| c.id.clone());
    draft.hide_when_quota_reached = params.hide_when_quota_reached;
    draft.punchcard = punchcard;

    let habit = Habit::new(session.user_id.clone(), draft)?;
    storage.create_habit(&habit)?;

    let message = format!(
        "✅ Created habit '{}' ({})! Ready to start your streak!",
        habit.name, habit.schedule.frequency_type
    );

    Ok(CreateHabitResponse {
        habit_id: habit.id.to_string(),
        habit: HabitWithCategory {
            habit,
            category: category.map(|c| c.to_ref()),
        },
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FrequencyType, RewardSpec, User};
    use crate::storage::SqliteStorage;

    fn setup() -> (SqliteStorage, Session) {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = User::register("Sam", "4821").unwrap();
        storage.create_user(&user).unwrap();
        storage.create_default_categories(&user.id).unwrap();
        (storage, user.session())
    }

    fn params(name: &str) -> CreateHabitParams {
        CreateHabitParams {
            name: name.to_string(),
            description: None,
            category_id: None,
            frequency_type: None,
            frequency_value: None,
            scheduled_days: None,
            monthly_day_of_week: None,
            monthly_week_occurrences: None,
            hide_when_quota_reached: false,
            punchcard_enabled: false,
            punchcard_target: None,
            reward_type: None,
            reward_text: None,
            jackpot_bag: None,
        }
    }

    #[test]
    fn test_create_with_category_and_punchcard() {
        let (storage, session) = setup();
        let fitness = storage
            .list_categories(&session.user_id)
            .unwrap()
            .into_iter()
            .find(|c| c.name == "Fitness")
            .unwrap();

        let mut p = params("Run");
        p.category_id = Some(fitness.id.to_string());
        p.frequency_type = Some("times_per_week".to_string());
        p.frequency_value = Some(3);
        p.punchcard_enabled = true;
        p.punchcard_target = Some(5);
        p.reward_type = Some("direct".to_string());
        p.reward_text = Some("New shoes".to_string());

        let response = create_habit(&storage, &session, p).unwrap();
        assert_eq!(response.habit.category.as_ref().map(|c| c.icon.as_str()), Some("💪"));

        let stored = storage.get_habit(&session.user_id, &response.habit.habit.id).unwrap();
        assert_eq!(stored.habit.schedule.frequency_type, FrequencyType::TimesPerWeek);
        assert_eq!(stored.habit.punchcard.target, 5);
        assert_eq!(
            stored.habit.punchcard.reward,
            Some(RewardSpec::Direct { text: "New shoes".to_string() })
        );
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let (storage, session) = setup();

        assert!(create_habit(&storage, &session, params("  ")).is_err());

        let mut zero = params("Gym");
        zero.frequency_type = Some("times_per_month".to_string());
        zero.frequency_value = Some(0);
        assert!(create_habit(&storage, &session, zero).is_err());

        let mut no_days = params("Gym");
        no_days.scheduled_days = Some(vec![]);
        assert!(create_habit(&storage, &session, no_days).is_err());

        let mut foreign = params("Gym");
        foreign.category_id = Some(crate::domain::CategoryId::new().to_string());
        assert!(create_habit(&storage, &session, foreign).is_err());

        assert!(storage.list_habits(&session.user_id, false).unwrap().is_empty());
    }
}
