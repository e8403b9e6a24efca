//! Derived views over habits and their completions
//!
//! Nothing here is stored. Each view is assembled per request from a habit
//! list, a completion snapshot and the caller's `today`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{
    completed_dates, is_available, should_hide, week_dates, week_start, Completion,
    CompletionCounts, HabitWithCategory, StreakSummary,
};

/// A habit with everything the today view shows about it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitWithStatus {
    #[serde(flatten)]
    pub habit: HabitWithCategory,
    pub counts: CompletionCounts,
    pub is_completed_today: bool,
    /// The quota for the current period is not yet met
    pub is_available: bool,
    pub is_due_today: bool,
    /// Quota met and the habit asked to be hidden when that happens
    pub hidden: bool,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// One cell of the week grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayStatus {
    pub date: NaiveDate,
    pub is_due: bool,
    pub completed: bool,
}

/// One habit's row in the week grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitWeek {
    #[serde(flatten)]
    pub habit: HabitWithCategory,
    pub days: Vec<DayStatus>,
    pub scheduled_dates: Vec<NaiveDate>,
    pub current_streak: u32,
}

/// Scheduled slots in a week across all habits, and how many were done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyPunchcardStats {
    pub total_scheduled: u32,
    pub completed: u32,
}

/// A single hole on a punchcard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PunchHole {
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_color: Option<String>,
}

/// The week grid for a Monday-start week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekView {
    pub week_start: NaiveDate,
    pub habits: Vec<HabitWeek>,
    pub stats: WeeklyPunchcardStats,
    pub holes: Vec<PunchHole>,
}

/// Assembles derived views from stored data
#[derive(Debug, Default)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Status of one habit as of `today`.
    ///
    /// `completions` must cover the current month and, for an exact streak,
    /// the trailing year.
    pub fn habit_status(
        &self,
        habit: &HabitWithCategory,
        completions: &[Completion],
        today: NaiveDate,
    ) -> HabitWithStatus {
        let h = &habit.habit;
        let counts = CompletionCounts::tally(&h.id, completions, today);
        let streak = StreakSummary::calculate(&h.id, &h.schedule, completions, today);

        HabitWithStatus {
            habit: habit.clone(),
            counts,
            is_completed_today: counts.today > 0,
            is_available: is_available(&h.schedule, &counts),
            is_due_today: h.schedule.is_due(today),
            hidden: should_hide(h, &counts),
            current_streak: streak.current,
            longest_streak: streak.longest,
        }
    }

    /// Status of every habit, in the order given
    pub fn statuses(
        &self,
        habits: &[HabitWithCategory],
        completions: &[Completion],
        today: NaiveDate,
    ) -> Vec<HabitWithStatus> {
        habits
            .iter()
            .map(|h| self.habit_status(h, completions, today))
            .collect()
    }

    /// Habits to show today: due today and not hidden by a met quota
    pub fn todays_habits(
        &self,
        habits: &[HabitWithCategory],
        completions: &[Completion],
        today: NaiveDate,
    ) -> Vec<HabitWithStatus> {
        self.statuses(habits, completions, today)
            .into_iter()
            .filter(|s| s.is_due_today && !s.hidden)
            .collect()
    }

    /// Week grid for the week containing `date`
    pub fn week_view(
        &self,
        habits: &[HabitWithCategory],
        completions: &[Completion],
        date: NaiveDate,
        today: NaiveDate,
    ) -> WeekView {
        let start = week_start(date);
        let rows: Vec<HabitWeek> = habits
            .iter()
            .map(|h| habit_week(h, completions, start, today))
            .collect();

        WeekView {
            week_start: start,
            stats: weekly_stats(&rows),
            holes: punch_holes(&rows),
            habits: rows,
        }
    }
}

fn habit_week(
    habit: &HabitWithCategory,
    completions: &[Completion],
    start: NaiveDate,
    today: NaiveDate,
) -> HabitWeek {
    let h = &habit.habit;
    let done = completed_dates(&h.id, completions);
    let days = week_dates(start)
        .into_iter()
        .map(|date| DayStatus {
            date,
            is_due: h.schedule.is_due(date),
            completed: done.contains(&date),
        })
        .collect();

    HabitWeek {
        habit: habit.clone(),
        days,
        scheduled_dates: h.schedule.due_dates_in_week(start),
        current_streak: StreakSummary::calculate(&h.id, &h.schedule, completions, today).current,
    }
}

/// Scheduled slots across the week grid and how many have a completion
pub fn weekly_stats(rows: &[HabitWeek]) -> WeeklyPunchcardStats {
    rows.iter()
        .flat_map(|row| row.days.iter())
        .filter(|d| d.is_due)
        .fold(WeeklyPunchcardStats::default(), |mut stats, day| {
            stats.total_scheduled += 1;
            if day.completed {
                stats.completed += 1;
            }
            stats
        })
}

/// One hole per scheduled slot: completed holes first in date order, then
/// the open ones in grid order
pub fn punch_holes(rows: &[HabitWeek]) -> Vec<PunchHole> {
    let mut slots: Vec<(Option<NaiveDate>, PunchHole)> = rows
        .iter()
        .flat_map(|row| {
            row.days.iter().filter(|d| d.is_due).map(move |day| {
                let category = row.habit.category.as_ref();
                (
                    day.completed.then_some(day.date),
                    PunchHole {
                        completed: day.completed,
                        category_icon: category.map(|c| c.icon.clone()),
                        category_color: category.map(|c| c.color.clone()),
                    },
                )
            })
        })
        .collect();

    // stable: open holes keep grid order
    slots.sort_by_key(|(completed_on, _)| match completed_on {
        Some(date) => (0, Some(*date)),
        None => (1, None),
    });

    slots.into_iter().map(|(_, hole)| hole).collect()
}

/// A punchcard of `size` holes with the first `filled` punched
pub fn sequential_holes(filled: u32, size: u32) -> Vec<PunchHole> {
    (0..size)
        .map(|i| PunchHole {
            completed: i < filled,
            category_icon: None,
            category_color: None,
        })
        .collect()
}
