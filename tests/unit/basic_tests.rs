/// Unit tests for the scheduling, streak and quota calculator
use chrono::{NaiveDate, Weekday};
use habit_punchcard_mcp::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn done_on(habit_id: &HabitId, dates: &[NaiveDate]) -> Vec<Completion> {
    dates
        .iter()
        .map(|d| Completion::at_local_midnight(habit_id.clone(), *d))
        .collect()
}

#[cfg(test)]
mod schedule_tests {
    use super::*;

    #[test]
    fn test_monthly_on_weeks_picks_occurrences() {
        // Mondays in March 2024: 4th, 11th, 18th, 25th
        let schedule = Schedule::monthly_on_weeks(Weekday::Mon, vec![1, 3]);
        assert!(schedule.is_due(date(2024, 3, 4)));
        assert!(!schedule.is_due(date(2024, 3, 11)));
        assert!(schedule.is_due(date(2024, 3, 18)));
        assert!(!schedule.is_due(date(2024, 3, 25)));
        assert!(!schedule.is_due(date(2024, 3, 5)));
    }

    #[test]
    fn test_fifth_occurrence_is_never_due() {
        let schedule = Schedule::monthly_on_weeks(Weekday::Mon, vec![1, 2, 3, 4]);
        assert_eq!(week_occurrence(date(2024, 4, 29)), 5);
        assert!(!schedule.is_due(date(2024, 4, 29)));
    }

    #[test]
    fn test_quota_habits_default_to_weekdays() {
        let schedule = Schedule::on_days(FrequencyType::TimesPerWeek, 3, Vec::new());
        assert!(schedule.validate().is_err());

        let mut schedule = Schedule::daily();
        schedule.frequency_type = FrequencyType::TimesPerWeek;
        schedule.frequency_value = 3;
        schedule.scheduled_days = None;
        assert!(schedule.is_due(date(2024, 3, 15)));
        assert!(!schedule.is_due(date(2024, 3, 16)));
    }

    #[test]
    fn test_week_starts_on_monday() {
        assert_eq!(week_start(date(2024, 3, 17)), date(2024, 3, 11));
        assert_eq!(week_start(date(2024, 3, 11)), date(2024, 3, 11));
        let days = Schedule::daily().due_dates_in_week(date(2024, 3, 11));
        assert_eq!(days.len(), 7);
        assert_eq!(days[6], date(2024, 3, 17));
    }
}

#[cfg(test)]
mod progress_tests {
    use super::*;

    #[test]
    fn test_streak_skips_unscheduled_days_and_waits_on_today() {
        let id = HabitId::new();
        let schedule = Schedule::on_days(FrequencyType::Daily, 1, WEEKDAYS.to_vec());
        // Fri, Mon, Tue done; Wednesday 13th not yet
        let completions = done_on(&id, &[date(2024, 3, 8), date(2024, 3, 11), date(2024, 3, 12)]);

        let streaks = StreakSummary::calculate(&id, &schedule, &completions, date(2024, 3, 13));
        assert_eq!(streaks.current, 3);
        assert_eq!(streaks.longest, 3);
    }

    #[test]
    fn test_missed_day_breaks_streak() {
        let id = HabitId::new();
        let completions = done_on(&id, &[date(2024, 3, 10), date(2024, 3, 12), date(2024, 3, 13)]);
        let streaks = StreakSummary::calculate(&id, &Schedule::daily(), &completions, date(2024, 3, 13));
        assert_eq!(streaks.current, 2);
    }

    #[test]
    fn test_quota_met_hides_habit() {
        let user = UserId::new();
        let mut draft = HabitDraft::new(
            "Gym",
            Schedule::on_days(FrequencyType::TimesPerWeek, 2, WEEKDAYS.to_vec()),
        );
        draft.hide_when_quota_reached = true;
        let habit = Habit::new(user, draft).unwrap();

        let today = date(2024, 3, 13);
        let one = done_on(&habit.id, &[date(2024, 3, 11)]);
        let counts = CompletionCounts::tally(&habit.id, &one, today);
        assert!(!should_hide(&habit, &counts));
        assert!(is_available(&habit.schedule, &counts));

        // last week's completion does not count toward this week
        let two = done_on(&habit.id, &[date(2024, 3, 8), date(2024, 3, 11), date(2024, 3, 12)]);
        let counts = CompletionCounts::tally(&habit.id, &two, today);
        assert_eq!(counts.this_week, 2);
        assert!(should_hide(&habit, &counts));
    }

    #[test]
    fn test_toggle_plan_matches_store() {
        let id = HabitId::new();
        let day = date(2024, 3, 13);

        let insert = plan_toggle(&id, day, false, false);
        assert!(insert.new_state);
        assert_eq!(insert.punchcard_delta, 1);
        assert!(matches!(insert.action, ToggleAction::Insert(_)));

        let remove = plan_toggle(&id, day, true, true);
        assert_eq!(remove.action, ToggleAction::Remove(day));
        assert_eq!(remove.punchcard_delta, -1);

        let already_gone = plan_toggle(&id, day, true, false);
        assert_eq!(already_gone.action, ToggleAction::Unchanged);
        assert_eq!(already_gone.punchcard_delta, 0);
    }

    #[test]
    fn test_punchcard_counter_stays_in_range() {
        let now = date(2024, 3, 13).and_hms_opt(8, 0, 0).unwrap();
        let mut card = PunchcardConfig::enabled(PunchcardSettings { target: 2, reward: None }, now);
        card.current = card.adjusted(5);
        assert_eq!(card.current, 2);
        assert!(card.is_full());
        card.current = card.adjusted(-9);
        assert_eq!(card.current, 0);
    }
}

#[cfg(test)]
mod storage_tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_storage_creation() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let storage = SqliteStorage::new(temp_file.path().to_path_buf()).unwrap();
        assert!(!storage.has_any_users().unwrap());
    }

    #[tokio::test]
    async fn test_server_creation() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let server = HabitTrackerServer::new(temp_file.path().to_path_buf()).await;
        assert!(server.is_ok());
    }
}
