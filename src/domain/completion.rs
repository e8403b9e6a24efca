//! Completion records
//!
//! One record per "done" event for a habit. Timestamps are local wall-clock
//! times; the calendar date of a completion is simply the date part.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::{CompletionId, HabitId};

/// A record of completing a habit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub id: CompletionId,
    pub habit_id: HabitId,
    /// Local time the completion counts for
    pub completed_at: NaiveDateTime,
}

impl Completion {
    /// Create a completion at an explicit local time
    pub fn new(habit_id: HabitId, completed_at: NaiveDateTime) -> Self {
        Self {
            id: CompletionId::new(),
            habit_id,
            completed_at,
        }
    }

    /// Create a completion stamped at local midnight of `date`.
    ///
    /// This is what toggling a day to "done" stores.
    pub fn at_local_midnight(habit_id: HabitId, date: NaiveDate) -> Self {
        Self::new(habit_id, date.and_time(NaiveTime::MIN))
    }

    /// Calendar date this completion counts for
    pub fn date(&self) -> NaiveDate {
        self.completed_at.date()
    }
}

/// Distinct calendar dates on which `habit_id` was completed
pub fn completed_dates(habit_id: &HabitId, completions: &[Completion]) -> BTreeSet<NaiveDate> {
    completions
        .iter()
        .filter(|c| &c.habit_id == habit_id)
        .map(Completion::date)
        .collect()
}
