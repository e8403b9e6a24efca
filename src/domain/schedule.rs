//! Recurrence rules and calendar helpers
//!
//! A `Schedule` answers one question: is this habit due on a given calendar
//! date? Weeks start on Monday and months are calendar months. All inputs are
//! local calendar dates; converting timestamps to dates happens upstream.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, FrequencyType};

/// Every day of the week, Sunday first to match the stored index order
pub const ALL_DAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Monday through Friday
pub const WEEKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// Highest week occurrence a monthly rule may name
pub const MAX_WEEK_OCCURRENCE: u32 = 4;

/// The recurrence rule of a habit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub frequency_type: FrequencyType,
    /// Quota for `times_per_week` / `times_per_month`; ignored otherwise
    pub frequency_value: u32,
    /// Days the habit shows up on. `None` falls back to the type's default.
    pub scheduled_days: Option<Vec<Weekday>>,
    /// Weekday used by `monthly_on_weeks`
    pub monthly_day_of_week: Option<Weekday>,
    /// Which occurrences (1..=4) of `monthly_day_of_week` are due
    pub monthly_week_occurrences: Vec<u32>,
}

impl Schedule {
    /// Every day of the week
    pub fn daily() -> Self {
        Self::on_days(FrequencyType::Daily, 1, ALL_DAYS.to_vec())
    }

    /// A weekday-set rule (`daily`, `times_per_week`, `times_per_month`)
    pub fn on_days(frequency_type: FrequencyType, frequency_value: u32, days: Vec<Weekday>) -> Self {
        Self {
            frequency_type,
            frequency_value,
            scheduled_days: Some(days),
            monthly_day_of_week: None,
            monthly_week_occurrences: Vec::new(),
        }
    }

    /// The Nth occurrence(s) of `day` in each month
    pub fn monthly_on_weeks(day: Weekday, occurrences: Vec<u32>) -> Self {
        Self {
            frequency_type: FrequencyType::MonthlyOnWeeks,
            frequency_value: 1,
            scheduled_days: None,
            monthly_day_of_week: Some(day),
            monthly_week_occurrences: occurrences,
        }
    }

    /// Days used when `scheduled_days` is absent
    pub fn default_days(frequency_type: FrequencyType) -> Vec<Weekday> {
        match frequency_type {
            FrequencyType::Daily => ALL_DAYS.to_vec(),
            _ => WEEKDAYS.to_vec(),
        }
    }

    /// Weekdays on which this habit can be due.
    ///
    /// For monthly rules this is the single configured weekday (or nothing);
    /// `is_due` narrows it further to the configured occurrences.
    pub fn effective_days(&self) -> Vec<Weekday> {
        match self.frequency_type {
            FrequencyType::MonthlyOnWeeks => self.monthly_day_of_week.into_iter().collect(),
            _ => self
                .scheduled_days
                .clone()
                .unwrap_or_else(|| Self::default_days(self.frequency_type)),
        }
    }

    /// Whether any date at all can be due under this rule
    pub fn has_scheduled_days(&self) -> bool {
        match self.frequency_type {
            FrequencyType::MonthlyOnWeeks => {
                self.monthly_day_of_week.is_some() && !self.monthly_week_occurrences.is_empty()
            }
            _ => !self.effective_days().is_empty(),
        }
    }

    /// Is the habit due on `date`?
    ///
    /// Malformed rules (no occurrences, empty day set) are simply never due.
    pub fn is_due(&self, date: NaiveDate) -> bool {
        match self.frequency_type {
            FrequencyType::MonthlyOnWeeks => match self.monthly_day_of_week {
                Some(day) if date.weekday() == day => {
                    self.monthly_week_occurrences.contains(&week_occurrence(date))
                }
                _ => false,
            },
            _ => self.effective_days().contains(&date.weekday()),
        }
    }

    /// Due dates within the Monday-start week beginning at `week_start`
    pub fn due_dates_in_week(&self, week_start: NaiveDate) -> Vec<NaiveDate> {
        week_dates(week_start)
            .into_iter()
            .filter(|d| self.is_due(*d))
            .collect()
    }

    /// Validate a rule before it is saved
    pub fn validate(&self) -> Result<(), DomainError> {
        match self.frequency_type {
            FrequencyType::Weekly => {
                return Err(DomainError::InvalidFrequency(
                    "The legacy 'weekly' frequency can't be used for new habits; use times_per_week"
                        .to_string(),
                ));
            }
            FrequencyType::TimesPerWeek => {
                if self.frequency_value == 0 || self.frequency_value > 7 {
                    return Err(DomainError::InvalidFrequency(format!(
                        "times_per_week must be 1-7, got {}",
                        self.frequency_value
                    )));
                }
            }
            FrequencyType::TimesPerMonth => {
                if self.frequency_value == 0 || self.frequency_value > 31 {
                    return Err(DomainError::InvalidFrequency(format!(
                        "times_per_month must be 1-31, got {}",
                        self.frequency_value
                    )));
                }
            }
            FrequencyType::MonthlyOnWeeks => {
                if self.monthly_day_of_week.is_none() {
                    return Err(DomainError::InvalidFrequency(
                        "monthly_on_weeks requires a day of week".to_string(),
                    ));
                }
                if self.monthly_week_occurrences.is_empty() {
                    return Err(DomainError::InvalidFrequency(
                        "monthly_on_weeks requires at least one week occurrence".to_string(),
                    ));
                }
                if let Some(bad) = self
                    .monthly_week_occurrences
                    .iter()
                    .find(|&&n| n == 0 || n > MAX_WEEK_OCCURRENCE)
                {
                    return Err(DomainError::InvalidFrequency(format!(
                        "Week occurrences must be 1-{}, got {}",
                        MAX_WEEK_OCCURRENCE, bad
                    )));
                }
                return Ok(());
            }
            FrequencyType::Daily => {}
        }

        if let Some(days) = &self.scheduled_days {
            if days.is_empty() {
                return Err(DomainError::InvalidFrequency(
                    "A habit must be scheduled on at least one day".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Which occurrence of its weekday `date` is within its month (1-based)
pub fn week_occurrence(date: NaiveDate) -> u32 {
    (date.day() + 6) / 7
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// The seven dates (Mon..Sun) of the week starting at `start`
pub fn week_dates(start: NaiveDate) -> [NaiveDate; 7] {
    let mut dates = [start; 7];
    for (offset, slot) in dates.iter_mut().enumerate() {
        *slot = start + Duration::days(offset as i64);
    }
    dates
}

/// First day of the calendar month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}
