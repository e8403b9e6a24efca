//! Progress calculation: completion counts, quotas, streaks and toggles
//!
//! Everything here is a pure function of a habit's schedule, a snapshot of its
//! completion records and the caller's notion of "today". The functions are
//! total: empty histories give zero counts and zero streaks, malformed
//! schedules are never due.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{
    completed_dates, week_start, Completion, FrequencyType, Habit, HabitId, Schedule,
};

/// How far back the current streak walk goes
pub const STREAK_LOOKBACK_DAYS: u32 = 365;

/// Calendar window for counting completions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    Today,
    /// Monday through Sunday containing today
    CurrentWeek,
    /// Calendar month containing today
    CurrentMonth,
}

impl Window {
    pub fn contains(&self, today: NaiveDate, date: NaiveDate) -> bool {
        match self {
            Window::Today => date == today,
            Window::CurrentWeek => week_start(date) == week_start(today),
            Window::CurrentMonth => date.year() == today.year() && date.month() == today.month(),
        }
    }
}

/// Number of completion records for `habit_id` inside `window`
pub fn count_completions(
    habit_id: &HabitId,
    completions: &[Completion],
    window: Window,
    today: NaiveDate,
) -> u32 {
    completions
        .iter()
        .filter(|c| &c.habit_id == habit_id && window.contains(today, c.date()))
        .count() as u32
}

/// Completion counts for the three windows a habit can be judged on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCounts {
    pub today: u32,
    pub this_week: u32,
    pub this_month: u32,
}

impl CompletionCounts {
    pub fn tally(habit_id: &HabitId, completions: &[Completion], today: NaiveDate) -> Self {
        Self {
            today: count_completions(habit_id, completions, Window::Today, today),
            this_week: count_completions(habit_id, completions, Window::CurrentWeek, today),
            this_month: count_completions(habit_id, completions, Window::CurrentMonth, today),
        }
    }
}

/// Has the habit met its quota for the current period?
///
/// Daily and monthly-on-weeks habits need one completion today. Legacy
/// `weekly` habits need one completion this week.
pub fn is_quota_satisfied(schedule: &Schedule, counts: &CompletionCounts) -> bool {
    match schedule.frequency_type {
        FrequencyType::Daily | FrequencyType::MonthlyOnWeeks => counts.today >= 1,
        FrequencyType::TimesPerWeek => counts.this_week >= schedule.frequency_value,
        FrequencyType::TimesPerMonth => counts.this_month >= schedule.frequency_value,
        FrequencyType::Weekly => counts.this_week >= 1,
    }
}

/// Can the habit still be completed in the current period?
pub fn is_available(schedule: &Schedule, counts: &CompletionCounts) -> bool {
    !is_quota_satisfied(schedule, counts)
}

/// Should the habit drop off today's list because its quota is met?
pub fn should_hide(habit: &Habit, counts: &CompletionCounts) -> bool {
    habit.hide_when_quota_reached
        && habit.schedule.frequency_type.is_quota_based()
        && is_quota_satisfied(&habit.schedule, counts)
}

/// Consecutive scheduled days with a completion, walking back from `today`.
///
/// A completed scheduled `today` counts. A scheduled but incomplete `today`
/// is pending: it neither counts nor ends the walk. The first scheduled past
/// day without a completion ends the walk; unscheduled days are skipped.
pub fn current_streak<F>(completed: &BTreeSet<NaiveDate>, is_scheduled: F, today: NaiveDate) -> u32
where
    F: Fn(NaiveDate) -> bool,
{
    if completed.is_empty() {
        return 0;
    }

    let mut streak = 0;
    if is_scheduled(today) && completed.contains(&today) {
        streak = 1;
    }

    let mut day = today.pred_opt();
    for _ in 0..STREAK_LOOKBACK_DAYS {
        let Some(checking) = day else { break };

        if is_scheduled(checking) {
            if completed.contains(&checking) {
                streak += 1;
            } else {
                break;
            }
        }

        day = checking.pred_opt();
    }

    streak
}

/// Longest run of consecutive completed scheduled days up to `today`.
///
/// Uses the same rules as `current_streak`, walking forward from the first
/// completion.
pub fn longest_streak<F>(completed: &BTreeSet<NaiveDate>, is_scheduled: F, today: NaiveDate) -> u32
where
    F: Fn(NaiveDate) -> bool,
{
    let Some(&first) = completed.iter().next() else {
        return 0;
    };

    let mut longest = 0;
    let mut run = 0;
    let mut day = first;
    while day <= today {
        if is_scheduled(day) {
            if completed.contains(&day) {
                run += 1;
                longest = longest.max(run);
            } else if day < today {
                run = 0;
            }
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    longest
}

/// Current and longest streak for a habit's schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
}

impl StreakSummary {
    pub fn calculate(
        habit_id: &HabitId,
        schedule: &Schedule,
        completions: &[Completion],
        today: NaiveDate,
    ) -> Self {
        if !schedule.has_scheduled_days() {
            return Self::default();
        }
        let dates = completed_dates(habit_id, completions);
        let current = current_streak(&dates, |d| schedule.is_due(d), today);
        let longest = longest_streak(&dates, |d| schedule.is_due(d), today);
        Self {
            current,
            longest: longest.max(current),
        }
    }
}

/// What the store must do to carry out a toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleAction {
    /// Insert this record
    Insert(Completion),
    /// Delete every record on this date
    Remove(NaiveDate),
    /// The store already reflects the requested state
    Unchanged,
}

/// Outcome of toggling one habit on one date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TogglePlan {
    pub new_state: bool,
    pub action: ToggleAction,
    /// Change to apply to the habit's punchcard counter, if it has one
    pub punchcard_delta: i64,
}

/// Decide what toggling `date` means given what the caller believes and what
/// the store actually holds for that date.
///
/// Toggling a completed date removes its record(s); toggling an incomplete
/// date inserts one record at local midnight. When the store already matches
/// the requested state nothing is written and the punchcard is left alone.
pub fn plan_toggle(
    habit_id: &HabitId,
    date: NaiveDate,
    is_currently_completed: bool,
    has_record_on_date: bool,
) -> TogglePlan {
    if is_currently_completed {
        TogglePlan {
            new_state: false,
            action: if has_record_on_date {
                ToggleAction::Remove(date)
            } else {
                ToggleAction::Unchanged
            },
            punchcard_delta: if has_record_on_date { -1 } else { 0 },
        }
    } else if has_record_on_date {
        TogglePlan {
            new_state: true,
            action: ToggleAction::Unchanged,
            punchcard_delta: 0,
        }
    } else {
        TogglePlan {
            new_state: true,
            action: ToggleAction::Insert(Completion::at_local_midnight(habit_id.clone(), date)),
            punchcard_delta: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HabitDraft, UserId, ALL_DAYS, WEEKDAYS};
    use chrono::{Duration, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn completions_on(habit: &HabitId, dates: &[NaiveDate]) -> Vec<Completion> {
        dates
            .iter()
            .map(|d| Completion::at_local_midnight(habit.clone(), *d))
            .collect()
    }

    fn mon_wed_fri() -> Schedule {
        Schedule::on_days(
            FrequencyType::Daily,
            1,
            vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
        )
    }

    #[test]
    fn test_counts_use_calendar_windows() {
        let habit = HabitId::new();
        // Wednesday 2024-03-13
        let today = date(2024, 3, 13);
        let completions = completions_on(
            &habit,
            &[
                date(2024, 3, 13),
                date(2024, 3, 11), // Monday, same week
                date(2024, 3, 10), // Sunday, previous week
                date(2024, 3, 1),  // same month
                date(2024, 2, 29), // previous month
            ],
        );

        let counts = CompletionCounts::tally(&habit, &completions, today);
        assert_eq!(counts.today, 1);
        assert_eq!(counts.this_week, 2);
        assert_eq!(counts.this_month, 4);
        assert_eq!(count_completions(&HabitId::new(), &completions, Window::CurrentMonth, today), 0);
    }

    #[test]
    fn test_times_per_week_quota() {
        let schedule = Schedule::on_days(FrequencyType::TimesPerWeek, 3, WEEKDAYS.to_vec());
        let two = CompletionCounts { today: 0, this_week: 2, this_month: 5 };
        let three = CompletionCounts { today: 1, this_week: 3, this_month: 6 };
        assert!(!is_quota_satisfied(&schedule, &two));
        assert!(is_quota_satisfied(&schedule, &three));
        assert!(is_available(&schedule, &two));
    }

    #[test]
    fn test_daily_and_monthly_quota_need_today() {
        let counts = CompletionCounts { today: 0, this_week: 4, this_month: 9 };
        assert!(!is_quota_satisfied(&Schedule::daily(), &counts));
        let monthly = Schedule::monthly_on_weeks(Weekday::Mon, vec![1]);
        assert!(!is_quota_satisfied(&monthly, &counts));
        let done = CompletionCounts { today: 1, ..counts };
        assert!(is_quota_satisfied(&monthly, &done));
    }

    #[test]
    fn test_times_per_month_and_legacy_weekly() {
        let monthly = Schedule::on_days(FrequencyType::TimesPerMonth, 4, WEEKDAYS.to_vec());
        assert!(!is_quota_satisfied(&monthly, &CompletionCounts { today: 0, this_week: 3, this_month: 3 }));
        assert!(is_quota_satisfied(&monthly, &CompletionCounts { today: 0, this_week: 0, this_month: 4 }));

        let weekly = Schedule::on_days(FrequencyType::Weekly, 1, WEEKDAYS.to_vec());
        assert!(is_quota_satisfied(&weekly, &CompletionCounts { today: 0, this_week: 1, this_month: 1 }));
    }

    #[test]
    fn test_empty_history() {
        let habit = HabitId::new();
        let today = date(2024, 3, 13);
        let counts = CompletionCounts::tally(&habit, &[], today);
        assert_eq!(counts, CompletionCounts::default());
        assert!(!is_quota_satisfied(&Schedule::daily(), &counts));
        assert_eq!(StreakSummary::calculate(&habit, &Schedule::daily(), &[], today), StreakSummary::default());
    }

    #[test]
    fn test_streak_skips_unscheduled_days() {
        let habit = HabitId::new();
        let schedule = mon_wed_fri();
        // Saturday; Mon 11, Wed 13, Fri 15 done; Fri 8 missed
        let today = date(2024, 3, 16);
        let dates = completed_dates(
            &habit,
            &completions_on(&habit, &[date(2024, 3, 11), date(2024, 3, 13), date(2024, 3, 15)]),
        );
        assert_eq!(current_streak(&dates, |d| schedule.is_due(d), today), 3);
    }

    #[test]
    fn test_streak_resets_after_gap() {
        let habit = HabitId::new();
        let schedule = mon_wed_fri();
        let today = date(2024, 3, 16);
        // Wednesday 13 missed
        let dates = completed_dates(
            &habit,
            &completions_on(&habit, &[date(2024, 3, 8), date(2024, 3, 11), date(2024, 3, 15)]),
        );
        assert_eq!(current_streak(&dates, |d| schedule.is_due(d), today), 1);
    }

    #[test]
    fn test_pending_today_does_not_break_streak() {
        let habit = HabitId::new();
        let schedule = mon_wed_fri();
        // Wednesday, not yet done today
        let today = date(2024, 3, 13);
        let dates = completed_dates(&habit, &completions_on(&habit, &[date(2024, 3, 8), date(2024, 3, 11)]));
        assert_eq!(current_streak(&dates, |d| schedule.is_due(d), today), 2);

        // Once marked, today counts too
        let dates = completed_dates(
            &habit,
            &completions_on(&habit, &[date(2024, 3, 8), date(2024, 3, 11), date(2024, 3, 13)]),
        );
        assert_eq!(current_streak(&dates, |d| schedule.is_due(d), today), 3);
    }

    #[test]
    fn test_empty_schedule_has_no_streak() {
        let habit = HabitId::new();
        let schedule = Schedule::on_days(FrequencyType::Daily, 1, vec![]);
        let today = date(2024, 3, 13);
        let completions = completions_on(&habit, &[today]);
        assert_eq!(StreakSummary::calculate(&habit, &schedule, &completions, today).current, 0);
    }

    #[test]
    fn test_streak_is_capped_by_lookback() {
        let today = date(2024, 12, 31);
        let dates: BTreeSet<NaiveDate> = (0..500).map(|i| today - Duration::days(i)).collect();
        let all = Schedule::on_days(FrequencyType::Daily, 1, ALL_DAYS.to_vec());
        assert_eq!(
            current_streak(&dates, |d| all.is_due(d), today),
            STREAK_LOOKBACK_DAYS + 1
        );
    }

    #[test]
    fn test_longest_streak() {
        let habit = HabitId::new();
        let schedule = Schedule::daily();
        let today = date(2024, 3, 20);
        let completions = completions_on(
            &habit,
            &[
                date(2024, 3, 1),
                date(2024, 3, 2),
                date(2024, 3, 3),
                date(2024, 3, 4),
                // gap on the 5th
                date(2024, 3, 6),
                date(2024, 3, 19),
            ],
        );
        let summary = StreakSummary::calculate(&habit, &schedule, &completions, today);
        assert_eq!(summary.longest, 4);
        assert_eq!(summary.current, 1);
    }

    #[test]
    fn test_monthly_streak_uses_actual_due_dates() {
        let habit = HabitId::new();
        let schedule = Schedule::monthly_on_weeks(Weekday::Mon, vec![1, 3]);
        // Due: Feb 5, Feb 19, Mar 4, Mar 18
        let today = date(2024, 3, 20);
        let completions = completions_on(&habit, &[date(2024, 2, 19), date(2024, 3, 4), date(2024, 3, 18)]);
        let summary = StreakSummary::calculate(&habit, &schedule, &completions, today);
        assert_eq!(summary.current, 3);
    }

    #[test]
    fn test_should_hide_only_quota_types() {
        let mut draft = HabitDraft::new(
            "Swim",
            Schedule::on_days(FrequencyType::TimesPerWeek, 2, WEEKDAYS.to_vec()),
        );
        draft.hide_when_quota_reached = true;
        let habit = Habit::new(UserId::new(), draft).unwrap();
        let met = CompletionCounts { today: 0, this_week: 2, this_month: 2 };
        assert!(should_hide(&habit, &met));
        assert!(!should_hide(&habit, &CompletionCounts { this_week: 1, ..met }));

        let mut daily = HabitDraft::new("Walk", Schedule::daily());
        daily.hide_when_quota_reached = true;
        let daily = Habit::new(UserId::new(), daily).unwrap();
        assert!(!should_hide(&daily, &CompletionCounts { today: 1, ..met }));
    }

    #[test]
    fn test_toggle_round_trip() {
        let habit = HabitId::new();
        let day = date(2024, 3, 13);

        let on = plan_toggle(&habit, day, false, false);
        assert!(on.new_state);
        assert_eq!(on.punchcard_delta, 1);
        match &on.action {
            ToggleAction::Insert(c) => assert_eq!(c.date(), day),
            other => panic!("expected insert, got {:?}", other),
        }

        let off = plan_toggle(&habit, day, true, true);
        assert!(!off.new_state);
        assert_eq!(off.action, ToggleAction::Remove(day));
        assert_eq!(off.punchcard_delta, -1);
    }

    #[test]
    fn test_toggle_is_idempotent_against_store() {
        let habit = HabitId::new();
        let day = date(2024, 3, 13);

        let stale_on = plan_toggle(&habit, day, false, true);
        assert!(stale_on.new_state);
        assert_eq!(stale_on.action, ToggleAction::Unchanged);
        assert_eq!(stale_on.punchcard_delta, 0);

        let stale_off = plan_toggle(&habit, day, true, false);
        assert!(!stale_off.new_state);
        assert_eq!(stale_off.action, ToggleAction::Unchanged);
        assert_eq!(stale_off.punchcard_delta, 0);
    }
}
