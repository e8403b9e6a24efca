//! MCP tools for habit management
//!
//! This module contains all the MCP tools that external clients can call to
//! interact with the habit tracker. Every tool is a plain function over the
//! storage traits; the caller's `Session` and the local `today` are passed in
//! explicitly.

pub mod account;
pub mod categories;
pub mod create;
pub mod punchcard;
pub mod rewards;
pub mod status;
pub mod toggle;
pub mod update;
pub mod week;

// Re-export tool functions for easy access
pub use account::*;
pub use categories::*;
pub use create::*;
pub use punchcard::*;
pub use rewards::*;
pub use status::*;
pub use toggle::*;
pub use update::*;
pub use week::*;

use chrono::{Duration, NaiveDate};
use thiserror::Error;

use crate::domain::{
    month_start, weekday_from_index, weekdays_from_indices, CategoryId, DomainError,
    FrequencyType, HabitId, PunchcardSettings, RewardBag, RewardId, RewardSpec, Schedule,
    DEFAULT_PUNCHCARD_TARGET, STREAK_LOOKBACK_DAYS,
};
use crate::storage::StorageError;

/// Errors a tool call can fail with
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("Not logged in. Call account_login (or account_register) first")]
    NotLoggedIn,

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

pub(crate) fn parse_habit_id(raw: &str) -> Result<HabitId, ToolError> {
    HabitId::from_string(raw)
        .map_err(|_| ToolError::InvalidParams(format!("Invalid habit ID format: {}", raw)))
}

pub(crate) fn parse_category_id(raw: &str) -> Result<CategoryId, ToolError> {
    CategoryId::from_string(raw)
        .map_err(|_| ToolError::InvalidParams(format!("Invalid category ID format: {}", raw)))
}

pub(crate) fn parse_reward_id(raw: &str) -> Result<RewardId, ToolError> {
    RewardId::from_string(raw)
        .map_err(|_| ToolError::InvalidParams(format!("Invalid reward ID format: {}", raw)))
}

/// Parse an optional `YYYY-MM-DD` date, defaulting to `today`
pub(crate) fn parse_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, ToolError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(today),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            ToolError::Domain(DomainError::InvalidDate(format!(
                "Invalid date format '{}'. Use YYYY-MM-DD",
                s
            )))
        }),
    }
}

/// Earliest date whose completions the views need: the streak lookback or
/// the start of the month, whichever is earlier
pub(crate) fn history_start(today: NaiveDate) -> NaiveDate {
    let lookback = today - Duration::days(i64::from(STREAK_LOOKBACK_DAYS) + 1);
    lookback.min(month_start(today))
}

/// Raw recurrence fields as they arrive from a tool call
#[derive(Debug, Clone, Default)]
pub(crate) struct ScheduleInput {
    pub frequency_type: Option<String>,
    pub frequency_value: Option<u32>,
    pub scheduled_days: Option<Vec<u8>>,
    pub monthly_day_of_week: Option<u8>,
    pub monthly_week_occurrences: Option<Vec<u32>>,
}

impl ScheduleInput {
    pub fn is_empty(&self) -> bool {
        self.frequency_type.is_none()
            && self.frequency_value.is_none()
            && self.scheduled_days.is_none()
            && self.monthly_day_of_week.is_none()
            && self.monthly_week_occurrences.is_none()
    }

    /// Build a schedule, taking anything not supplied from `base`
    pub fn into_schedule(self, base: Option<&Schedule>) -> Result<Schedule, ToolError> {
        let frequency_type = match (&self.frequency_type, base) {
            (Some(raw), _) => raw.parse::<FrequencyType>()?,
            (None, Some(b)) => b.frequency_type,
            (None, None) => FrequencyType::Daily,
        };
        let switching = base.map_or(true, |b| b.frequency_type != frequency_type);

        let schedule = match frequency_type {
            FrequencyType::MonthlyOnWeeks => {
                let day = match self.monthly_day_of_week {
                    Some(i) => Some(weekday_from_index(i).ok_or_else(|| {
                        DomainError::InvalidFrequency(format!("Day of week must be 0-6, got {}", i))
                    })?),
                    None => base.filter(|_| !switching).and_then(|b| b.monthly_day_of_week),
                };
                let occurrences = match self.monthly_week_occurrences {
                    Some(o) => o,
                    None => base
                        .filter(|_| !switching)
                        .map(|b| b.monthly_week_occurrences.clone())
                        .unwrap_or_default(),
                };
                let day = day.ok_or_else(|| {
                    DomainError::InvalidFrequency(
                        "monthly_on_weeks needs monthly_day_of_week (0-6)".to_string(),
                    )
                })?;
                Schedule::monthly_on_weeks(day, occurrences)
            }
            _ => {
                let days = match self.scheduled_days {
                    Some(indices) => Some(weekdays_from_indices(&indices)?),
                    None => base.filter(|_| !switching).and_then(|b| b.scheduled_days.clone()),
                };
                let value = self
                    .frequency_value
                    .or_else(|| base.filter(|_| !switching).map(|b| b.frequency_value))
                    .unwrap_or(1);
                Schedule {
                    frequency_type,
                    frequency_value: value,
                    scheduled_days: days,
                    monthly_day_of_week: None,
                    monthly_week_occurrences: Vec::new(),
                }
            }
        };

        schedule.validate()?;
        Ok(schedule)
    }
}

/// Raw punchcard fields as they arrive from a tool call
#[derive(Debug, Clone, Default)]
pub(crate) struct PunchcardInput {
    pub target: Option<u32>,
    pub reward_type: Option<String>,
    pub reward_text: Option<String>,
    pub jackpot_bag: Option<String>,
}

impl PunchcardInput {
    pub fn into_settings(self) -> Result<PunchcardSettings, ToolError> {
        let reward = match self.reward_type.as_deref().map(|s| s.trim().to_lowercase()) {
            None => None,
            Some(t) if t.is_empty() || t == "none" => None,
            Some(t) if t == "direct" => Some(RewardSpec::Direct {
                text: self.reward_text.unwrap_or_default().trim().to_string(),
            }),
            Some(t) if t == "jackpot" => Some(RewardSpec::Jackpot {
                bag: match self.jackpot_bag {
                    Some(b) => b.parse::<RewardBag>()?,
                    None => RewardBag::default(),
                },
            }),
            Some(other) => {
                return Err(ToolError::InvalidParams(format!(
                    "Unknown reward_type '{}'. Valid options: direct, jackpot, none",
                    other
                )))
            }
        };

        let settings = PunchcardSettings {
            target: self.target.unwrap_or(DEFAULT_PUNCHCARD_TARGET),
            reward,
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(None, today()).unwrap(), today());
        assert_eq!(
            parse_date(Some("2024-03-01"), today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_date(Some("03/01/2024"), today()).is_err());
    }

    #[test]
    fn test_schedule_input_defaults_to_daily() {
        let schedule = ScheduleInput::default().into_schedule(None).unwrap();
        assert_eq!(schedule.frequency_type, FrequencyType::Daily);
        assert!(schedule.is_due(today()));
    }

    #[test]
    fn test_schedule_input_monthly() {
        let input = ScheduleInput {
            frequency_type: Some("monthly_on_weeks".to_string()),
            monthly_day_of_week: Some(1),
            monthly_week_occurrences: Some(vec![1, 3]),
            ..Default::default()
        };
        let schedule = input.into_schedule(None).unwrap();
        assert_eq!(schedule.monthly_day_of_week, Some(Weekday::Mon));

        let missing_day = ScheduleInput {
            frequency_type: Some("monthly_on_weeks".to_string()),
            monthly_week_occurrences: Some(vec![1]),
            ..Default::default()
        };
        assert!(missing_day.into_schedule(None).is_err());
    }

    #[test]
    fn test_schedule_input_keeps_base_fields() {
        let base = Schedule::on_days(FrequencyType::TimesPerWeek, 3, vec![Weekday::Mon, Weekday::Tue]);
        let input = ScheduleInput {
            frequency_value: Some(2),
            ..Default::default()
        };
        let schedule = input.into_schedule(Some(&base)).unwrap();
        assert_eq!(schedule.frequency_value, 2);
        assert_eq!(schedule.scheduled_days, Some(vec![Weekday::Mon, Weekday::Tue]));
    }

    #[test]
    fn test_legacy_weekly_rejected() {
        let input = ScheduleInput {
            frequency_type: Some("weekly".to_string()),
            ..Default::default()
        };
        assert!(matches!(input.into_schedule(None), Err(ToolError::Domain(_))));
    }

    #[test]
    fn test_punchcard_input() {
        let settings = PunchcardInput {
            target: Some(5),
            reward_type: Some("jackpot".to_string()),
            jackpot_bag: Some("baby".to_string()),
            ..Default::default()
        }
        .into_settings()
        .unwrap();
        assert_eq!(settings.reward, Some(RewardSpec::Jackpot { bag: RewardBag::Baby }));

        let blank_direct = PunchcardInput {
            reward_type: Some("direct".to_string()),
            ..Default::default()
        };
        assert!(blank_direct.into_settings().is_err());
    }
}
