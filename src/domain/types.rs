//! Core types and enums used throughout the domain layer
//!
//! This module defines the identifier newtypes, the frequency rules a habit can
//! follow, reward bag classification, and the weekday index convention
//! (0 = Sunday .. 6 = Saturday) used by stored schedules.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Declares a UUID-backed identifier newtype.
///
/// Each id is a distinct type so a habit id can't be passed where a user id
/// is expected.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an id from its string form (database rows, tool arguments)
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Unique identifier for a registered user
    UserId
);
id_type!(
    /// Unique identifier for a habit
    HabitId
);
id_type!(
    /// Unique identifier for a single completion record
    CompletionId
);
id_type!(
    /// Unique identifier for a user-defined category
    CategoryId
);
id_type!(
    /// Unique identifier for a reward in the reward pool
    RewardId
);

/// How a habit recurs
///
/// `Weekly` is a legacy value kept so old rows still load. New habits can't
/// be created with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyType {
    /// Every scheduled weekday
    Daily,
    /// A quota of completions per Monday-start week
    TimesPerWeek,
    /// A quota of completions per calendar month
    TimesPerMonth,
    /// The Nth occurrence(s) of one weekday in each month
    MonthlyOnWeeks,
    /// Legacy "once a week"
    Weekly,
}

impl FrequencyType {
    /// Storage/wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyType::Daily => "daily",
            FrequencyType::TimesPerWeek => "times_per_week",
            FrequencyType::TimesPerMonth => "times_per_month",
            FrequencyType::MonthlyOnWeeks => "monthly_on_weeks",
            FrequencyType::Weekly => "weekly",
        }
    }

    /// Whether completions count against a weekly or monthly quota
    pub fn is_quota_based(&self) -> bool {
        matches!(self, FrequencyType::TimesPerWeek | FrequencyType::TimesPerMonth)
    }
}

impl FromStr for FrequencyType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(FrequencyType::Daily),
            "times_per_week" => Ok(FrequencyType::TimesPerWeek),
            "times_per_month" => Ok(FrequencyType::TimesPerMonth),
            "monthly_on_weeks" => Ok(FrequencyType::MonthlyOnWeeks),
            "weekly" => Ok(FrequencyType::Weekly),
            other => Err(DomainError::InvalidFrequency(format!(
                "Unknown frequency '{}'. Valid options: daily, times_per_week, times_per_month, monthly_on_weeks",
                other
            ))),
        }
    }
}

impl fmt::Display for FrequencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pool a jackpot reward is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RewardBag {
    /// Small everyday treats
    Baby,
    /// Bigger rewards
    #[default]
    Baller,
}

impl RewardBag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardBag::Baby => "baby",
            RewardBag::Baller => "baller",
        }
    }
}

impl FromStr for RewardBag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "baby" => Ok(RewardBag::Baby),
            "baller" => Ok(RewardBag::Baller),
            other => Err(DomainError::InvalidValue {
                message: format!("Unknown reward bag '{}'. Valid options: baby, baller", other),
            }),
        }
    }
}

/// Convert a stored weekday index (0 = Sunday) into a `Weekday`
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Convert a `Weekday` into its stored index (0 = Sunday)
pub fn weekday_index(day: Weekday) -> u8 {
    day.num_days_from_sunday() as u8
}

/// Parse a list of weekday indices, rejecting anything outside 0..=6
pub fn weekdays_from_indices(indices: &[u8]) -> Result<Vec<Weekday>, DomainError> {
    indices
        .iter()
        .map(|&i| {
            weekday_from_index(i).ok_or_else(|| {
                DomainError::InvalidFrequency(format!("Day of week must be 0-6, got {}", i))
            })
        })
        .collect()
}
